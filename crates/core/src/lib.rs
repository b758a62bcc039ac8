pub mod config;
pub mod distance;
pub mod error;
pub mod filter;
pub mod models;
pub mod reconcile;
pub mod route;

pub use config::{AppConfig, MapSettings, PlannerSettings, RecommenderSettings, WalkSettings};
pub use distance::distance_km;
pub use error::{CatalogError, PlannerError, RecommendationError};
pub use filter::{filter_by_radius, filter_diverse, DEFAULT_MIN_SEPARATION_KM};
pub use models::*;
pub use reconcile::{
    build_recommendation_request, ensure_enough_candidates, reconcile, Reconciliation,
};
pub use route::{build_route, PlannedRoute};
