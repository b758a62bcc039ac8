use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use walks_agents::WalkPlanner;
use walks_catalog::Catalog;
use walks_core::{
    AppConfig, Coordinate, MapSettings, PlannerError, UserProfile, WalkRequest, WalkSettings,
};
use walks_observability::AppMetrics;
use walks_recommender::{Recommender, RecommenderBackend};

/// Extra time granted on top of the HTTP client timeout before the planner
/// abandons a recommender call.
const RECOMMEND_GRACE_SECS: u64 = 5;

#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<WalkPlanner<RecommenderBackend>>,
    pub metrics: Arc<AppMetrics>,
    pub config: Arc<AppConfig>,
}

impl ApiState {
    pub fn new(config: AppConfig, catalog: Catalog, recommender: RecommenderBackend) -> Self {
        let metrics = AppMetrics::shared();
        let recommend_timeout =
            Duration::from_secs(config.api.timeout_secs.max(1) + RECOMMEND_GRACE_SECS);
        let planner = Arc::new(WalkPlanner::new(
            catalog,
            Arc::new(recommender),
            config.planner,
            recommend_timeout,
            metrics.clone(),
        ));

        Self {
            planner,
            metrics,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: walks_observability::MetricsSnapshot,
    catalog: walks_catalog::CatalogStats,
    recommender: &'static str,
}

#[derive(Debug, Serialize)]
struct PublicConfig<'a> {
    app_name: &'a str,
    privacy_policy_url: &'a str,
    city_name: &'a str,
    map: &'a MapSettings,
    walk_settings: &'a WalkSettings,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateRouteRequest {
    name: Option<String>,
    age: Option<u32>,
    interests: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    duration: Option<f64>,
    radius: Option<f64>,
    places_count: Option<usize>,
    return_to_start: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct NearbyQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<f64>,
    #[serde(default)]
    diverse: bool,
}

/// Loads the catalog named by the config and wires the recommender chosen by
/// the presence of `CHUTES_API_TOKEN`.
pub async fn build_app(config: AppConfig) -> Result<Router> {
    let catalog = Catalog::load(&config.catalog.path, &config.catalog.strip_prefixes)
        .with_context(|| format!("failed to load catalog from {}", config.catalog.path))?;

    let recommender = RecommenderBackend::from_settings(
        &config.api,
        &config.city_name,
        env::var("CHUTES_API_TOKEN").ok(),
    )?;
    info!(
        places = catalog.len(),
        recommender = recommender.backend_name(),
        "walk planner ready"
    );

    Ok(build_router(ApiState::new(config, catalog, recommender)))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/config", get(api_config))
        .route("/api/places", get(places))
        .route("/api/places/nearby", get(places_nearby))
        .route("/api/generate-route", post(generate_route))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        catalog: state.planner.catalog().stats(),
        recommender: state.planner.recommender_name(),
    };
    (StatusCode::OK, Json(payload))
}

async fn api_config(State(state): State<ApiState>) -> impl IntoResponse {
    let config = state.config.as_ref();
    let payload = PublicConfig {
        app_name: &config.app_name,
        privacy_policy_url: &config.privacy_policy_url,
        city_name: &config.city_name,
        map: &config.map,
        walk_settings: &config.walk_settings,
    };
    (StatusCode::OK, Json(payload)).into_response()
}

async fn places(State(state): State<ApiState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.planner.catalog().places())).into_response()
}

async fn places_nearby(
    State(state): State<ApiState>,
    Query(query): Query<NearbyQuery>,
) -> Response {
    let center = state.config.default_center();
    let origin = Coordinate::new(
        query.lat.unwrap_or(center.lat),
        query.lon.unwrap_or(center.lon),
    );
    if !origin.is_valid() {
        return ApiError::from(PlannerError::InvalidRequest(
            "lat must be within [-90, 90] and lon within [-180, 180]".to_string(),
        ))
        .into_response();
    }

    let radius_km = query
        .radius
        .unwrap_or(state.config.walk_settings.radius.default);
    let found = if query.diverse {
        state.planner.diverse_nearby(origin, radius_km)
    } else {
        state.planner.nearby(origin, radius_km)
    };

    (StatusCode::OK, Json(found)).into_response()
}

async fn generate_route(
    State(state): State<ApiState>,
    payload: Result<Json<GenerateRouteRequest>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => {
            return ApiError::from(PlannerError::InvalidRequest(rejection.body_text()))
                .into_response()
        }
    };

    let request = walk_request_from(input, &state.config);
    info!(
        user = %request.profile.name,
        duration_hours = request.duration_hours,
        "route requested"
    );

    match state.planner.plan_route(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => ApiError::from(error).into_response(),
    }
}

fn walk_request_from(input: GenerateRouteRequest, config: &AppConfig) -> WalkRequest {
    let defaults = UserProfile::default();
    let center = config.default_center();
    let walk = &config.walk_settings;

    WalkRequest {
        profile: UserProfile {
            name: input.name.unwrap_or(defaults.name),
            age: input.age.unwrap_or(defaults.age),
            interests: input.interests.unwrap_or(defaults.interests),
        },
        location: Coordinate::new(
            input.latitude.unwrap_or(center.lat),
            input.longitude.unwrap_or(center.lon),
        ),
        radius_km: input.radius.unwrap_or(walk.radius.default),
        duration_hours: input.duration.unwrap_or(walk.duration.default),
        places_count: input.places_count.unwrap_or(walk.places_count.default),
        return_to_start: input.return_to_start.unwrap_or(false),
    }
}

/// Maps planner failures onto the `{ error, message }` body. Recommender
/// details stay in the logs; the client only sees a generic message.
struct ApiError(PlannerError);

impl From<PlannerError> for ApiError {
    fn from(error: PlannerError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            error!(error = %self.0, "route generation failed");
            (
                StatusCode::BAD_GATEWAY,
                "the place recommendation service is unavailable, please try again later"
                    .to_string(),
            )
        };

        (
            status,
            Json(serde_json::json!({
                "error": self.0.code(),
                "message": message
            })),
        )
            .into_response()
    }
}
