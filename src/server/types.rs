//! Request/response bodies and error mapping for the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{ContactStatus, ScanOutcome, SubmissionRun};

/// Body of `POST /api/scan`.
///
/// Targets come either as persisted target ids or as ad-hoc raw URLs; the
/// throttle overrides are optional and clamped server-side.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScanRequest {
    pub target_ids: Option<Vec<i64>>,
    pub urls: Option<Vec<String>>,
    pub batch_size: Option<usize>,
    /// Inter-batch delay override, in milliseconds.
    pub batch_delay: Option<u64>,
    pub concurrent: Option<usize>,
}

/// Inline response for a single-target scan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleScanResponse {
    pub status: ContactStatus,
    pub contact_url: Option<String>,
    pub message: String,
    pub success: bool,
}

impl From<ScanOutcome> for SingleScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        Self {
            success: outcome.status == ContactStatus::Found,
            status: outcome.status,
            contact_url: outcome.contact_url,
            message: outcome.message,
        }
    }
}

/// Acknowledgement for a multi-target scan; results are observed by polling
/// the persisted target/outcome records.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScanResponse {
    /// Always `"processing"`.
    pub status: &'static str,
    pub total: usize,
}

/// Body of `POST /api/submissions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionApiRequest {
    pub url: String,
    /// Field-mapping template forwarded to the automation executable.
    pub template: serde_json::Value,
    pub domain_id: Option<i64>,
    pub template_id: Option<i64>,
    pub operator_id: Option<i64>,
}

/// Response of `POST /api/submissions`. The HTTP status code mirrors the
/// automation attempt, not just request validity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub status: String,
    pub message: String,
    pub run_id: i64,
}

/// Response of `GET /api/submissions/{id}`, for pollers tracking a run.
/// `finishedAt` is null while the automation is still in flight.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusResponse {
    pub run_id: i64,
    pub url: String,
    pub status: String,
    pub message: String,
    pub created_at: i64,
    pub finished_at: Option<i64>,
}

impl From<SubmissionRun> for RunStatusResponse {
    fn from(run: SubmissionRun) -> Self {
        Self {
            run_id: run.id,
            url: run.url,
            status: run.status,
            message: run.message,
            created_at: run.created_at,
            finished_at: run.finished_at,
        }
    }
}

/// Snapshot returned by `GET /status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub targets: i64,
    pub contact_checks: i64,
    pub runs_running: i64,
    pub runs_success: i64,
    pub runs_failed: i64,
}

/// API-level errors; everything else is encoded in response bodies.
#[derive(Debug)]
pub enum ApiError {
    /// Structurally invalid request; no side effects occurred.
    BadRequest(String),
    /// The referenced record does not exist.
    NotFound(String),
    /// Unexpected internal failure (database, wiring).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<crate::error_handling::DatabaseError> for ApiError {
    fn from(e: crate::error_handling::DatabaseError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
