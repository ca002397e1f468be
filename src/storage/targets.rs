//! Target rows and the append-only contact check log.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::models::{ScanOutcome, Target};

/// Inserts a new target row and returns its id.
///
/// Targets normally arrive through the dashboard's upload flow; this exists
/// for programmatic creation and tests.
pub async fn insert_target(
    pool: &SqlitePool,
    url: &str,
    category: Option<&str>,
) -> Result<i64, DatabaseError> {
    let result = sqlx::query("INSERT INTO targets (url, category, created_at) VALUES (?, ?, ?)")
        .bind(url)
        .bind(category)
        .bind(Utc::now().timestamp_millis())
        .execute(pool)
        .await
        .map_err(DatabaseError::SqlError)?;
    Ok(result.last_insert_rowid())
}

/// Fetches targets by id, preserving nothing about request order.
///
/// Ids that match no row are simply absent from the result; the caller
/// decides whether that is an error.
pub async fn fetch_targets_by_ids(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<Target>, DatabaseError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // sqlx has no slice binding for SQLite; build the placeholder list.
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id, url, category FROM targets WHERE id IN ({})",
        placeholders
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::SqlError)?;

    Ok(rows
        .into_iter()
        .map(|row| Target {
            id: Some(row.get::<i64, _>("id")),
            url: row.get::<String, _>("url"),
            category: row.get::<Option<String>, _>("category"),
        })
        .collect())
}

/// Appends one outcome row to the audit log and, when the target has a
/// persistent row, overwrites its current-status fields to the latest result.
///
/// Prior `contact_checks` rows are never touched.
pub async fn record_scan_outcome(
    pool: &SqlitePool,
    target: &Target,
    outcome: &ScanOutcome,
) -> Result<(), DatabaseError> {
    let checked_at = Utc::now().timestamp_millis();

    sqlx::query(
        "INSERT INTO contact_checks (target_id, url, status, contact_url, message, checked_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(target.id)
    .bind(&target.url)
    .bind(outcome.status.as_str())
    .bind(outcome.contact_url.as_deref())
    .bind(&outcome.message)
    .bind(checked_at)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    if let Some(target_id) = target.id {
        sqlx::query(
            "UPDATE targets
             SET contact_check_status = ?, contact_page_url = ?, contact_checked_at = ?
             WHERE id = ?",
        )
        .bind(outcome.status.as_str())
        .bind(outcome.contact_url.as_deref())
        .bind(checked_at)
        .bind(target_id)
        .execute(pool)
        .await
        .map_err(DatabaseError::SqlError)?;
    }

    Ok(())
}

/// Row counts used by the status endpoint.
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64, DatabaseError> {
    // Table names come from a fixed internal list, never from callers.
    let sql = format!("SELECT COUNT(*) AS n FROM {}", table);
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .map_err(DatabaseError::SqlError)?;
    Ok(row.get::<i64, _>("n"))
}
