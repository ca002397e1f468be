//! Main application entry point (CLI binary).
//!
//! Thin wrapper around the `contact_sweep` library: parses arguments, loads
//! `.env`, initializes logging and the database, and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use contact_sweep::config::{Config, RunSettings, PROBE_HTTP_TIMEOUT};
use contact_sweep::initialization::{init_logger_with, init_probe_client};
use contact_sweep::runner::RunOrchestrator;
use contact_sweep::server::{start_server, AppState};
use contact_sweep::storage::{init_db_pool_with_path, run_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let pool = init_db_pool_with_path(&config.db_path)
        .await
        .context("Failed to initialize database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let probe_client = init_probe_client(&config.user_agent, PROBE_HTTP_TIMEOUT)
        .context("Failed to initialize HTTP client")?;

    let runner = Arc::new(RunOrchestrator::new(
        Arc::clone(&pool),
        RunSettings::new(
            config.automation_bin.clone(),
            Duration::from_secs(config.run_timeout_seconds),
        ),
    ));

    log::info!(
        "contact_sweep starting (db: {}, automation: {})",
        config.db_path.display(),
        config.automation_bin.display()
    );

    start_server(
        config.port,
        AppState {
            pool,
            probe_client,
            runner,
        },
    )
    .await
    .context("API server failed")?;

    Ok(())
}
