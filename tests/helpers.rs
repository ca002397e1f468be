// Shared test helpers for database setup.
//
// SQLite in-memory pools give every pooled connection its own database, so
// concurrent writers would see missing tables. Tests therefore use a
// file-backed database inside a temp directory that lives as long as the
// handle.

use sqlx::SqlitePool;
use tempfile::TempDir;

use contact_sweep::storage::run_migrations;

/// A migrated, file-backed test database. Dropping it deletes the files.
#[allow(dead_code)] // Used by other test files
pub struct TestDb {
    pub pool: SqlitePool,
    _dir: TempDir,
}

/// Creates a file-backed test database with migrations applied.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");

    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .read(true)
        .open(&db_path)
        .expect("Failed to create database file");

    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.to_string_lossy()))
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    TestDb { pool, _dir: dir }
}
