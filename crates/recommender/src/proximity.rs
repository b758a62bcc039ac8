use walks_core::{RecommendationError, RecommendationRequest, Selection};

use crate::Recommender;

/// Offline recommender: picks the nearest candidates. Used when no API token
/// is configured and as a deterministic stand-in for local runs.
#[derive(Debug, Clone, Default)]
pub struct ProximityRecommender;

impl Recommender for ProximityRecommender {
    fn backend_name(&self) -> &'static str {
        "proximity"
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Selection>, RecommendationError> {
        let interests = request.profile.interests.trim();

        Ok(request
            .candidates
            .iter()
            .take(request.target_count)
            .map(|candidate| {
                let reason = if interests.is_empty() {
                    format!(
                        "Всего {:.2} км от вас: удобная остановка для неспешной прогулки.",
                        candidate.distance_km
                    )
                } else {
                    format!(
                        "Всего {:.2} км от вас, хороший выбор с учётом ваших интересов: {}.",
                        candidate.distance_km, interests
                    )
                };
                Selection::new(candidate.name.clone(), reason)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use walks_core::{CandidateSummary, UserProfile};

    use super::*;

    #[tokio::test]
    async fn picks_nearest_candidates_in_order() {
        let candidates = ["Кремль", "Стрелка", "Домик Петра I"]
            .iter()
            .enumerate()
            .map(|(index, name)| CandidateSummary {
                name: name.to_string(),
                address: format!("Нижний Новгород, {name}"),
                distance_km: index as f64,
                description: String::new(),
            })
            .collect();
        let request = RecommendationRequest {
            profile: UserProfile {
                interests: "история".to_string(),
                ..UserProfile::default()
            },
            target_count: 2,
            candidates,
        };

        let picks = ProximityRecommender.recommend(&request).await.unwrap();

        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0].place_name, "Кремль");
        assert_eq!(picks[1].place_name, "Стрелка");
        assert!(picks[1].reason.contains("история"));
        assert!(picks[1].reason.starts_with("Всего 1.00 км от вас"));
    }
}
