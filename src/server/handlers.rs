//! HTTP handlers for scan requests, submission runs, and the status snapshot.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use url::Url;

use crate::config::{ScanOverrides, ScanSettings};
use crate::error_handling::{DatabaseError, OrchestratorError};
use crate::models::{RunStatus, Target};
use crate::probe::HttpContactProbe;
use crate::runner::SubmissionRequest;
use crate::scanner::{dispatch_scan, BatchScanner, ScanDispatch};
use crate::storage::{self, RunLinkage};

use super::types::*;
use super::AppState;

/// POST /api/scan
///
/// One target: scanned synchronously, outcome inline. Many targets:
/// acknowledged immediately, pipeline runs in the background.
pub async fn scan_handler(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Response, ApiError> {
    let targets = collect_targets(&state, &request).await?;
    if targets.is_empty() {
        return Err(ApiError::BadRequest("no targets to scan".into()));
    }

    // The wire interface exposes batch size, concurrency, and the
    // inter-batch delay; the per-request stagger stays server-controlled.
    let settings = ScanSettings::with_overrides(ScanOverrides {
        batch_size: request.batch_size,
        concurrent: request.concurrent,
        batch_delay_ms: request.batch_delay,
        ..ScanOverrides::default()
    });
    let scanner = Arc::new(BatchScanner::new(
        HttpContactProbe::new(Arc::clone(&state.probe_client)),
        Arc::clone(&state.pool),
        settings,
    ));

    match dispatch_scan(scanner, targets).await {
        ScanDispatch::Completed(outcome) => {
            Ok((StatusCode::OK, Json(SingleScanResponse::from(outcome))).into_response())
        }
        ScanDispatch::Accepted { total } => Ok((
            StatusCode::ACCEPTED,
            Json(BulkScanResponse {
                status: "processing",
                total,
            }),
        )
            .into_response()),
    }
}

/// Resolves the request's target ids and raw URLs into one target list,
/// rejecting the whole request on any unknown id or malformed URL.
async fn collect_targets(
    state: &AppState,
    request: &ScanRequest,
) -> Result<Vec<Target>, ApiError> {
    let mut targets = Vec::new();

    if let Some(ids) = request.target_ids.as_deref() {
        let found = storage::fetch_targets_by_ids(&state.pool, ids).await?;
        if found.len() != ids.len() {
            return Err(ApiError::BadRequest(format!(
                "{} of {} target ids are unknown",
                ids.len() - found.len(),
                ids.len()
            )));
        }
        targets.extend(found);
    }

    for raw in request.urls.as_deref().unwrap_or_default() {
        if raw.trim().is_empty() || Url::parse(raw).is_err() {
            return Err(ApiError::BadRequest(format!("invalid url: {raw:?}")));
        }
        targets.push(Target::from_url(raw.clone()));
    }

    Ok(targets)
}

/// POST /api/submissions
///
/// Runs the automation once. The HTTP status reflects the attempt itself:
/// 200 for a successful submission, 502 when the automation failed.
pub async fn submission_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmissionApiRequest>,
) -> Result<Response, ApiError> {
    let report = state
        .runner
        .execute(SubmissionRequest {
            url: request.url,
            template: request.template,
            linkage: RunLinkage {
                domain_id: request.domain_id,
                template_id: request.template_id,
                operator_id: request.operator_id,
            },
        })
        .await
        .map_err(|e| match e {
            OrchestratorError::InvalidInput(message) => ApiError::BadRequest(message),
            OrchestratorError::Database(e) => ApiError::Internal(e.to_string()),
        })?;

    let http_status = match report.status {
        RunStatus::Success => StatusCode::OK,
        _ => StatusCode::BAD_GATEWAY,
    };
    Ok((
        http_status,
        Json(SubmissionResponse {
            status: report.status.to_string(),
            message: report.message,
            run_id: report.run_id,
        }),
    )
        .into_response())
}

/// GET /api/submissions/{id}
///
/// Poll endpoint for a submission run; dashboards watch `finishedAt` flip
/// from null to the terminal timestamp.
pub async fn run_status_handler(
    State(state): State<AppState>,
    Path(run_id): Path<i64>,
) -> Result<Json<RunStatusResponse>, ApiError> {
    match storage::fetch_run(&state.pool, run_id).await {
        Ok(run) => Ok(Json(RunStatusResponse::from(run))),
        Err(DatabaseError::SqlError(sqlx::Error::RowNotFound)) => {
            Err(ApiError::NotFound(format!("run {run_id} not found")))
        }
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// GET /status
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusSnapshot>, ApiError> {
    let snapshot = StatusSnapshot {
        targets: storage::count_rows(&state.pool, "targets").await?,
        contact_checks: storage::count_rows(&state.pool, "contact_checks").await?,
        runs_running: storage::count_runs_with_status(&state.pool, RunStatus::Running).await?,
        runs_success: storage::count_runs_with_status(&state.pool, RunStatus::Success).await?,
        runs_failed: storage::count_runs_with_status(&state.pool, RunStatus::Failed).await?,
    };
    Ok(Json(snapshot))
}
