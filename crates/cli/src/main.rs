use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use walks_agents::WalkPlanner;
use walks_catalog::Catalog;
use walks_core::{AppConfig, Coordinate, UserProfile, WalkRequest};
use walks_observability::{init_tracing, AppMetrics};
use walks_recommender::RecommenderBackend;

#[derive(Debug, Parser)]
#[command(name = "walks")]
#[command(about = "Walking route planner CLI")]
struct Cli {
    #[arg(long, env = "WALKS_CONFIG", default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Builds a route and prints it as JSON.
    Plan {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value = "")]
        interests: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        return_to_start: bool,
        /// Use nearest-first picks instead of the remote recommender.
        #[arg(long)]
        offline: bool,
    },
    /// Lists catalog places around a point.
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long)]
        diverse: bool,
    },
    Places,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("walks_cli");
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)?;
    config.apply_env_overrides();

    let catalog = Catalog::load(&config.catalog.path, &config.catalog.strip_prefixes)
        .with_context(|| format!("failed loading catalog from {}", config.catalog.path))?;

    match cli.command {
        Command::Plan {
            lat,
            lon,
            radius,
            count,
            interests,
            name,
            age,
            return_to_start,
            offline,
        } => {
            let recommender = if offline {
                RecommenderBackend::proximity()
            } else {
                RecommenderBackend::from_settings(
                    &config.api,
                    &config.city_name,
                    env::var("CHUTES_API_TOKEN").ok(),
                )?
            };
            let planner = build_planner(&config, catalog, recommender);
            let profile = UserProfile::default();

            let result = planner
                .plan_route(WalkRequest {
                    profile: UserProfile {
                        name: name.unwrap_or(profile.name),
                        age: age.unwrap_or(profile.age),
                        interests,
                    },
                    location: Coordinate::new(lat, lon),
                    radius_km: radius.unwrap_or(config.walk_settings.radius.default),
                    duration_hours: config.walk_settings.duration.default,
                    places_count: count.unwrap_or(config.walk_settings.places_count.default),
                    return_to_start,
                })
                .await?;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Nearby {
            lat,
            lon,
            radius,
            diverse,
        } => {
            let planner = build_planner(&config, catalog, RecommenderBackend::proximity());
            let origin = Coordinate::new(lat, lon);
            let radius_km = radius.unwrap_or(config.walk_settings.radius.default);

            let found = if diverse {
                planner.diverse_nearby(origin, radius_km)
            } else {
                planner.nearby(origin, radius_km)
            };
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Places => {
            let stats = catalog.stats();
            println!(
                "{} places loaded, {} records skipped",
                stats.places_loaded, stats.records_skipped
            );
            println!("{}", serde_json::to_string_pretty(catalog.places())?);
        }
    }

    Ok(())
}

fn build_planner(
    config: &AppConfig,
    catalog: Catalog,
    recommender: RecommenderBackend,
) -> WalkPlanner<RecommenderBackend> {
    WalkPlanner::new(
        catalog,
        Arc::new(recommender),
        config.planner,
        Duration::from_secs(config.api.timeout_secs.max(1) + 5),
        AppMetrics::shared(),
    )
}
