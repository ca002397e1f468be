//! Submission run rows: created once in `running`, finalized exactly once.

use chrono::Utc;
use log::warn;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::models::{RunStatus, SubmissionRun};

/// Linkage identifiers a submission run may carry back to dashboard records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLinkage {
    pub domain_id: Option<i64>,
    pub template_id: Option<i64>,
    pub operator_id: Option<i64>,
}

/// Inserts the `running` row for a new submission attempt and returns its id.
///
/// This happens before the automation process is spawned, so even a run that
/// dies mid-flight leaves a traceable record.
pub async fn insert_run(
    pool: &SqlitePool,
    url: &str,
    linkage: RunLinkage,
) -> Result<i64, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO submission_runs (url, status, message, domain_id, template_id, operator_id, created_at)
         VALUES (?, ?, '', ?, ?, ?, ?)",
    )
    .bind(url)
    .bind(RunStatus::Running.as_str())
    .bind(linkage.domain_id)
    .bind(linkage.template_id)
    .bind(linkage.operator_id)
    .bind(Utc::now().timestamp_millis())
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(result.last_insert_rowid())
}

/// Applies the single terminal update to a run row.
///
/// The `finished_at IS NULL` guard makes the update idempotent at the row
/// level: a second finalize attempt matches no rows and is logged, not
/// applied. Status transitions are therefore forward-only.
pub async fn finalize_run(
    pool: &SqlitePool,
    run_id: i64,
    status: RunStatus,
    message: &str,
) -> Result<(), DatabaseError> {
    debug_assert!(status.is_terminal());

    let result = sqlx::query(
        "UPDATE submission_runs
         SET status = ?, message = ?, finished_at = ?
         WHERE id = ? AND finished_at IS NULL",
    )
    .bind(status.as_str())
    .bind(message)
    .bind(Utc::now().timestamp_millis())
    .bind(run_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    if result.rows_affected() == 0 {
        warn!("Run {run_id} was already finalized; dropping duplicate update ({status})");
    }

    Ok(())
}

/// Fetches a single run row.
pub async fn fetch_run(pool: &SqlitePool, run_id: i64) -> Result<SubmissionRun, DatabaseError> {
    sqlx::query_as::<_, SubmissionRun>(
        "SELECT id, url, status, message, domain_id, template_id, operator_id, created_at, finished_at
         FROM submission_runs WHERE id = ?",
    )
    .bind(run_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::SqlError)
}

/// Counts runs currently in a given status, for the status endpoint.
pub async fn count_runs_with_status(
    pool: &SqlitePool,
    status: RunStatus,
) -> Result<i64, DatabaseError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submission_runs WHERE status = ?")
        .bind(status.as_str())
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::SqlError)?;
    Ok(n)
}
