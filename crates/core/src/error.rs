use std::time::Duration;

use thiserror::Error;

/// Failures of the external recommender. Every variant is a server-side
/// failure: the request cannot be completed and is not retried here.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("recommender is not reachable: {0}")]
    Unreachable(String),
    #[error("recommender did not answer within {0:?}")]
    Timeout(Duration),
    #[error("recommender returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("recommender response is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(
        "only {available} distinct places (at least {min_separation_km} km apart) were found within {radius_km} km, \
         but {requested} were requested; increase the search radius or reduce the number of places"
    )]
    InsufficientCandidates {
        available: usize,
        requested: usize,
        radius_km: f64,
        min_separation_km: f64,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    RecommendationService(#[from] RecommendationError),
}

impl PlannerError {
    /// Whether the caller can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCandidates { .. } | Self::InvalidRequest(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientCandidates { .. } => "insufficient_candidates",
            Self::InvalidRequest(_) => "invalid_request",
            Self::RecommendationService(_) => "recommendation_service_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog record on line {line} is malformed: {reason}")]
    MalformedRecord { line: usize, reason: String },
}
