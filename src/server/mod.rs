//! HTTP API for the scan and submission engines.
//!
//! Endpoints:
//! - `POST /api/scan` - contact-page scan (inline for one target,
//!   background job for many)
//! - `POST /api/submissions` - one automation run
//! - `GET /api/submissions/{id}` - poll a run's record
//! - `GET /status` - liveness/progress snapshot

mod handlers;
mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;

use crate::runner::RunOrchestrator;

use handlers::{run_status_handler, scan_handler, status_handler, submission_handler};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<SqlitePool>,
    /// HTTP client shared by all contact-page probes.
    pub probe_client: Arc<reqwest::Client>,
    pub runner: Arc<RunOrchestrator>,
}

/// Builds the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scan", post(scan_handler))
        .route("/api/submissions", post(submission_handler))
        .route("/api/submissions/{id}", get(run_status_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Binds and serves the API until a shutdown signal arrives.
pub async fn start_server(port: u16, state: AppState) -> Result<(), anyhow::Error> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind API server to port {}: {}", port, e))?;

    log::info!("API server listening on http://0.0.0.0:{}/", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    Ok(())
}

/// Waits for SIGINT (Ctrl-C) or SIGTERM so the server shuts down cleanly
/// whether stopped interactively or by a process manager. Background scan
/// jobs still in flight are lost; their completed targets are already
/// persisted.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            log::info!("Received Ctrl-C, shutting down");
        }
        () = terminate => {
            log::info!("Received SIGTERM, shutting down");
        }
    }
}
