use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::filter::DEFAULT_MIN_SEPARATION_KM;
use crate::models::Coordinate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_name: String,
    pub privacy_policy_url: String,
    pub city_name: String,
    pub map: MapSettings,
    pub walk_settings: WalkSettings,
    pub api: RecommenderSettings,
    pub planner: PlannerSettings,
    pub catalog: CatalogSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Volga Vibes".to_string(),
            privacy_policy_url: "/privacy".to_string(),
            city_name: "Нижний Новгород".to_string(),
            map: MapSettings::default(),
            walk_settings: WalkSettings::default(),
            api: RecommenderSettings::default(),
            planner: PlannerSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed reading config at {}", path.as_ref().display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config json at {}", path.as_ref().display()))
    }

    /// Reads the file when it exists, otherwise starts from defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_json_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Applies `WALKS_CATALOG_PATH`, `WALKS_RECOMMENDER_URL` and
    /// `WALKS_RECOMMENDER_MODEL` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = lookup("WALKS_CATALOG_PATH") {
            self.catalog.path = path;
        }
        if let Some(base_url) = lookup("WALKS_RECOMMENDER_URL") {
            self.api.base_url = base_url;
        }
        if let Some(model) = lookup("WALKS_RECOMMENDER_MODEL") {
            self.api.model = model;
        }
    }

    pub fn default_center(&self) -> Coordinate {
        Coordinate::new(self.map.default_center[0], self.map.default_center[1])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub default_center: [f64; 2],
    pub default_zoom: u8,
    pub tile_layer: String,
    pub attribution: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            default_center: [56.3269, 44.0059],
            default_zoom: 13,
            tile_layer: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeSetting<T> {
    pub min: T,
    pub max: T,
    pub default: T,
    pub step: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    pub duration: RangeSetting<f64>,
    pub radius: RangeSetting<f64>,
    pub places_count: RangeSetting<usize>,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            duration: RangeSetting {
                min: 1.0,
                max: 8.0,
                default: 3.0,
                step: 0.5,
            },
            radius: RangeSetting {
                min: 0.5,
                max: 10.0,
                default: 3.0,
                step: 0.5,
            },
            places_count: RangeSetting {
                min: 2,
                max: 10,
                default: 5,
                step: 1,
            },
        }
    }
}

/// Connection settings for the chat-completions recommender. The API token
/// is never part of the file; it comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderSettings {
    #[serde(alias = "chutes_base_url")]
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://llm.chutes.ai/v1".to_string(),
            model: "deepseek-ai/DeepSeek-V3-0324".to_string(),
            timeout_secs: 30,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub min_separation_km: f64,
    pub max_context_places: usize,
    pub description_chars: usize,
    pub walking_speed_kmh: f64,
    pub dwell_hours_per_stop: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            min_separation_km: DEFAULT_MIN_SEPARATION_KM,
            max_context_places: 30,
            description_chars: 200,
            walking_speed_kmh: 4.0,
            dwell_hours_per_stop: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub path: String,
    pub strip_prefixes: Vec<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: "data/places.jsonl".to_string(),
            strip_prefixes: vec![
                "г. Нижний Новгород, ".to_string(),
                "Нижний Новгород, ".to_string(),
            ],
        }
    }
}
