mod prompt;
mod proximity;
mod remote;

use anyhow::Result;
use tracing::warn;
use walks_core::{RecommendationError, RecommendationRequest, RecommenderSettings, Selection};

pub use prompt::{system_prompt, user_prompt};
pub use proximity::ProximityRecommender;
pub use remote::{parse_selections, ChatCompletionsRecommender};

/// Picks places for a user from a candidate list. Implementations are
/// untrusted: they may return fewer or more picks than requested, repeat
/// names, or return names that do not match any candidate exactly.
pub trait Recommender: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Selection>, RecommendationError>;
}

#[derive(Debug, Clone)]
pub enum RecommenderBackend {
    Remote(ChatCompletionsRecommender),
    Proximity(ProximityRecommender),
}

impl RecommenderBackend {
    pub fn proximity() -> Self {
        Self::Proximity(ProximityRecommender)
    }

    /// The remote backend when a token is available, the offline one otherwise.
    pub fn from_settings(
        settings: &RecommenderSettings,
        city_name: &str,
        api_token: Option<String>,
    ) -> Result<Self> {
        match api_token.filter(|token| !token.trim().is_empty()) {
            Some(token) => Ok(Self::Remote(ChatCompletionsRecommender::new(
                settings, city_name, token,
            )?)),
            None => {
                warn!("no recommender API token configured, using offline proximity picks");
                Ok(Self::proximity())
            }
        }
    }
}

impl Recommender for RecommenderBackend {
    fn backend_name(&self) -> &'static str {
        match self {
            RecommenderBackend::Remote(backend) => backend.backend_name(),
            RecommenderBackend::Proximity(backend) => backend.backend_name(),
        }
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Selection>, RecommendationError> {
        match self {
            RecommenderBackend::Remote(backend) => backend.recommend(request).await,
            RecommenderBackend::Proximity(backend) => backend.recommend(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_proximity_without_token() {
        let settings = RecommenderSettings::default();
        let backend = RecommenderBackend::from_settings(&settings, "Нижний Новгород", None).unwrap();
        assert_eq!(backend.backend_name(), "proximity");

        let blank = RecommenderBackend::from_settings(&settings, "Нижний Новгород", Some(" ".into()))
            .unwrap();
        assert_eq!(blank.backend_name(), "proximity");
    }

    #[test]
    fn uses_remote_with_token() {
        let settings = RecommenderSettings::default();
        let backend =
            RecommenderBackend::from_settings(&settings, "Нижний Новгород", Some("token".into()))
                .unwrap();
        assert_eq!(backend.backend_name(), "chat-completions");
    }
}
