//! Melbourne House Price Estimator - Main Entry Point
//!
//! Usage: `price-estimator [CONFIG_FILE]`

use anyhow::Context;
use api::{init_logging, run_server, settings::AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.logging)?;

    info!("=== Price Estimator v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Model: {}, scaler: {}",
        config.artifacts.model_path, config.artifacts.scaler_path
    );

    run_server(config).await?;

    Ok(())
}
