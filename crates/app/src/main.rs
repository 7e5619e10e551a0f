//! Gardenwise - garden maintenance reminder worker
//!
//! Loads configuration, wires the scheduler and runs the notification
//! dispatcher until Ctrl-C.

use anyhow::Context;
use gardenwise_app::AppContext;
use gardenwise_infra::config;
use gardenwise_infra::observability::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    init_tracing().context("failed to initialise logging")?;
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    let config = config::load().context("failed to load configuration")?;
    let ctx = AppContext::new_with_config(config)
        .await
        .context("failed to initialise application")?;

    ctx.start().await.context("failed to start dispatcher")?;
    tracing::info!("Gardenwise started; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested");

    ctx.shutdown().await.context("shutdown failed")?;
    if let Ok(snapshot) = serde_json::to_string(&ctx.metrics_snapshot()) {
        tracing::info!(metrics = %snapshot, "Gardenwise stopped");
    }
    Ok(())
}
