use std::env;

use anyhow::Result;
use walks_api::build_app;
use walks_core::AppConfig;
use walks_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing("walks_api");

    let config_path = env::var("WALKS_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let bind = env::var("WALKS_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let mut config = AppConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, config = %config_path, "walk route api started");

    axum::serve(listener, app).await?;
    Ok(())
}
