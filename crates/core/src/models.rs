use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A catalog entry. Built once at load time and only ever read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub address: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(default)]
    pub description: String,
}

/// A place as seen from one request: distance to the user and, once the place
/// has been picked for a route, the reason it was picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPlace {
    #[serde(flatten)]
    pub place: Place,
    pub distance_from_user: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_reason: Option<String>,
}

impl AnnotatedPlace {
    pub fn new(place: Place, distance_from_user: f64) -> Self {
        Self {
            place,
            distance_from_user,
            selection_reason: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.place.id
    }

    pub fn name(&self) -> &str {
        &self.place.name
    }

    pub fn coordinate(&self) -> Coordinate {
        self.place.coordinate
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.selection_reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub interests: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Гость".to_string(),
            age: 25,
            interests: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkRequest {
    pub profile: UserProfile,
    pub location: Coordinate,
    pub radius_km: f64,
    pub duration_hours: f64,
    pub places_count: usize,
    pub return_to_start: bool,
}

/// The summary of one candidate handed to the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub address: String,
    pub distance_km: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub profile: UserProfile,
    pub target_count: usize,
    pub candidates: Vec<CandidateSummary>,
}

/// One pick returned by the recommender. `place_name` is free text and is not
/// guaranteed to match any catalog name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub place_name: String,
    #[serde(default)]
    pub reason: String,
}

impl Selection {
    pub fn new(place_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            place_name: place_name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub route: Vec<AnnotatedPlace>,
    pub total_distance_km: f64,
    pub estimated_time_hours: f64,
    pub user_location: Coordinate,
}
