use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use walks_catalog::Catalog;
use walks_core::{
    build_recommendation_request, build_route, ensure_enough_candidates, filter_by_radius,
    filter_diverse, reconcile, AnnotatedPlace, Coordinate, PlannerError, PlannerSettings,
    RecommendationError, RouteResult, WalkRequest,
};
use walks_observability::{AppMetrics, RecommenderFailure};
use walks_recommender::Recommender;

/// Runs the route pipeline for one request at a time against a shared,
/// read-only catalog. Holds no per-request state, so one planner serves any
/// number of concurrent requests.
pub struct WalkPlanner<R>
where
    R: Recommender,
{
    catalog: Catalog,
    recommender: Arc<R>,
    settings: PlannerSettings,
    recommend_timeout: Duration,
    metrics: Arc<AppMetrics>,
}

impl<R> WalkPlanner<R>
where
    R: Recommender,
{
    pub fn new(
        catalog: Catalog,
        recommender: Arc<R>,
        settings: PlannerSettings,
        recommend_timeout: Duration,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            catalog,
            recommender,
            settings,
            recommend_timeout,
            metrics,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn recommender_name(&self) -> &'static str {
        self.recommender.backend_name()
    }

    pub fn nearby(&self, origin: Coordinate, radius_km: f64) -> Vec<AnnotatedPlace> {
        filter_by_radius(self.catalog.places(), origin, radius_km)
    }

    pub fn diverse_nearby(&self, origin: Coordinate, radius_km: f64) -> Vec<AnnotatedPlace> {
        filter_diverse(self.nearby(origin, radius_km), self.settings.min_separation_km)
    }

    #[instrument(
        skip(self, request),
        fields(
            radius_km = request.radius_km,
            places_count = request.places_count,
            return_to_start = request.return_to_start
        )
    )]
    pub async fn plan_route(&self, request: WalkRequest) -> Result<RouteResult, PlannerError> {
        let started = Instant::now();
        self.metrics.inc_route_request();

        let outcome = self.run_pipeline(&request).await;
        self.metrics.observe_latency(started.elapsed());

        match &outcome {
            Ok(result) => {
                self.metrics.inc_route_built();
                info!(
                    stops = result.route.len(),
                    total_distance_km = result.total_distance_km,
                    estimated_time_hours = result.estimated_time_hours,
                    "route built"
                );
            }
            Err(PlannerError::InsufficientCandidates { .. }) => {
                self.metrics.inc_insufficient_candidates();
            }
            Err(PlannerError::RecommendationService(error)) => {
                self.metrics.inc_recommender_failure(failure_kind(error));
                warn!(%error, backend = self.recommender_name(), "recommender failed");
            }
            Err(PlannerError::InvalidRequest(_)) => {}
        }

        outcome
    }

    async fn run_pipeline(&self, request: &WalkRequest) -> Result<RouteResult, PlannerError> {
        validate(request)?;

        let nearby = self.nearby(request.location, request.radius_km);
        info!(found = nearby.len(), "places within radius");

        let candidates = filter_diverse(nearby, self.settings.min_separation_km);
        info!(
            diverse = candidates.len(),
            min_separation_km = self.settings.min_separation_km,
            "diverse candidates"
        );

        ensure_enough_candidates(
            &candidates,
            request.places_count,
            request.radius_km,
            self.settings.min_separation_km,
        )?;

        let recommendation = build_recommendation_request(
            &request.profile,
            &candidates,
            request.places_count,
            &self.settings,
        );
        let selections = tokio::time::timeout(
            self.recommend_timeout,
            self.recommender.recommend(&recommendation),
        )
        .await
        .map_err(|_| RecommendationError::Timeout(self.recommend_timeout))??;
        info!(
            returned = selections.len(),
            requested = request.places_count,
            "recommender answered"
        );

        let reconciled = reconcile(
            &candidates,
            &selections,
            request.places_count,
            self.settings.min_separation_km,
        );
        self.metrics.record_reconciliation(reconciled.matched, reconciled.backfilled);
        info!(
            matched = reconciled.matched,
            backfilled = reconciled.backfilled,
            "selections reconciled"
        );
        for place in &reconciled.places {
            debug!(id = place.id(), name = place.name(), "selected");
        }

        let planned = build_route(reconciled.places, request.return_to_start, &self.settings);

        Ok(RouteResult {
            route: planned.stops,
            total_distance_km: planned.total_distance_km,
            estimated_time_hours: planned.estimated_time_hours,
            user_location: request.location,
        })
    }
}

fn failure_kind(error: &RecommendationError) -> RecommenderFailure {
    match error {
        RecommendationError::Timeout(_) => RecommenderFailure::Timeout,
        RecommendationError::Unreachable(_) => RecommenderFailure::Unreachable,
        RecommendationError::Status { .. } => RecommenderFailure::BadStatus,
        RecommendationError::Malformed(_) => RecommenderFailure::Malformed,
    }
}

fn validate(request: &WalkRequest) -> Result<(), PlannerError> {
    if !request.location.is_valid() {
        return Err(PlannerError::InvalidRequest(
            "latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
        ));
    }
    if request.places_count == 0 {
        return Err(PlannerError::InvalidRequest(
            "places_count must be at least 1".to_string(),
        ));
    }
    if !request.radius_km.is_finite() {
        return Err(PlannerError::InvalidRequest(
            "radius must be a finite number of kilometers".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use walks_core::{Place, RecommendationRequest, Selection, UserProfile};

    use super::*;

    const KM_PER_DEGREE_LAT: f64 = 110.574;

    struct FixedRecommender(Vec<Selection>);

    impl Recommender for FixedRecommender {
        fn backend_name(&self) -> &'static str {
            "fixed"
        }

        async fn recommend(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<Vec<Selection>, RecommendationError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRecommender;

    impl Recommender for FailingRecommender {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        async fn recommend(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<Vec<Selection>, RecommendationError> {
            Err(RecommendationError::Malformed("not json".to_string()))
        }
    }

    struct SlowRecommender;

    impl Recommender for SlowRecommender {
        fn backend_name(&self) -> &'static str {
            "slow"
        }

        async fn recommend(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<Vec<Selection>, RecommendationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    /// Five places due north of the origin at 0, 1, 2, 3 and 4 km.
    fn line_catalog() -> Catalog {
        Catalog::new(
            (0..5)
                .map(|km| Place {
                    id: km,
                    name: format!("km {km}"),
                    address: format!("Нижний Новгород, km {km}"),
                    coordinate: Coordinate::new(km as f64 / KM_PER_DEGREE_LAT, 0.0),
                    description: String::new(),
                })
                .collect(),
        )
    }

    fn planner<R: Recommender>(recommender: R) -> WalkPlanner<R> {
        WalkPlanner::new(
            line_catalog(),
            Arc::new(recommender),
            PlannerSettings {
                min_separation_km: 0.5,
                ..PlannerSettings::default()
            },
            Duration::from_millis(200),
            AppMetrics::shared(),
        )
    }

    fn request(places_count: usize) -> WalkRequest {
        WalkRequest {
            profile: UserProfile {
                name: "Ivan".to_string(),
                age: 40,
                interests: "river views".to_string(),
            },
            location: Coordinate::new(0.0, 0.0),
            radius_km: 10.0,
            duration_hours: 3.0,
            places_count,
            return_to_start: false,
        }
    }

    fn ids(result: &RouteResult) -> Vec<i64> {
        result.route.iter().map(AnnotatedPlace::id).collect()
    }

    #[tokio::test]
    async fn line_scenario_backfills_and_orders() {
        let planner = planner(FixedRecommender(vec![
            Selection::new("km 1", "Панорама Волги"),
            Selection::new("km 3", "Старая купеческая улица"),
        ]));

        let result = planner.plan_route(request(3)).await.unwrap();

        assert_eq!(ids(&result), vec![0, 1, 3]);
        assert!((result.total_distance_km - 3.0).abs() < 0.01);
        assert!((result.estimated_time_hours - 2.25).abs() < 0.01);
        assert_eq!(result.user_location, Coordinate::new(0.0, 0.0));
        assert_eq!(
            result.route[1].selection_reason.as_deref(),
            Some("Панорама Волги")
        );

        let snapshot = planner.metrics.snapshot();
        assert_eq!(snapshot.routes_built_total, 1);
        assert_eq!(snapshot.matched_places_total, 2);
        assert_eq!(snapshot.backfilled_places_total, 1);
    }

    #[tokio::test]
    async fn exact_count_for_any_response_size() {
        let responses = vec![
            Vec::new(),
            vec![
                Selection::new("km 4", "a"),
                Selection::new("km 2", "b"),
                Selection::new("km 0", "c"),
            ],
            (0..5)
                .rev()
                .map(|km| Selection::new(format!("km {km}"), "many"))
                .collect(),
        ];

        for selections in responses {
            let planner = planner(FixedRecommender(selections));
            let result = planner.plan_route(request(3)).await.unwrap();

            assert_eq!(result.route.len(), 3);
            let unique = result.route.iter().map(AnnotatedPlace::id).collect::<HashSet<_>>();
            assert_eq!(unique.len(), 3);
            assert!(result
                .route
                .iter()
                .all(|p| p.selection_reason.as_deref().is_some_and(|r| !r.is_empty())));
        }
    }

    #[tokio::test]
    async fn too_few_candidates_is_rejected() {
        // only km 0 and km 1 are within 1.5 km
        let planner = planner(FixedRecommender(Vec::new()));
        let mut walk = request(4);
        walk.radius_km = 1.5;

        let error = planner.plan_route(walk).await.unwrap_err();

        match error {
            PlannerError::InsufficientCandidates {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 4);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(planner.metrics.snapshot().insufficient_candidates_total, 1);
    }

    #[tokio::test]
    async fn recommender_failure_is_not_backfilled() {
        let planner = planner(FailingRecommender);
        let error = planner.plan_route(request(2)).await.unwrap_err();
        assert!(matches!(
            error,
            PlannerError::RecommendationService(RecommendationError::Malformed(_))
        ));
        let snapshot = planner.metrics.snapshot();
        assert_eq!(snapshot.recommender_failures_total, 1);
        assert_eq!(snapshot.recommender_failures.malformed, 1);
    }

    #[tokio::test]
    async fn slow_recommender_times_out() {
        let planner = planner(SlowRecommender);
        let error = planner.plan_route(request(2)).await.unwrap_err();
        assert!(matches!(
            error,
            PlannerError::RecommendationService(RecommendationError::Timeout(_))
        ));
        assert_eq!(planner.metrics.snapshot().recommender_failures.timeout, 1);
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_routes() {
        let planner = planner(FixedRecommender(vec![Selection::new("km 2", "x")]));
        let mut walk = request(3);
        walk.return_to_start = true;

        let first = planner.plan_route(walk.clone()).await.unwrap();
        let second = planner.plan_route(walk).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let planner = planner(FixedRecommender(Vec::new()));

        let error = planner.plan_route(request(0)).await.unwrap_err();
        assert!(matches!(error, PlannerError::InvalidRequest(_)));

        let mut walk = request(2);
        walk.location = Coordinate::new(120.0, 0.0);
        let error = planner.plan_route(walk).await.unwrap_err();
        assert!(error.is_client_error());
    }
}
