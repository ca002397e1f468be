//! Error type definitions.
//!
//! Per-target scan failures never surface here: they are downgraded to
//! `error` outcomes and counted. These types cover the boundaries where a
//! failure must stop the operation itself.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Error types for the run orchestrator.
///
/// Anything past input validation and the initial `running` record is
/// contained: spawn failures, timeouts, and non-zero exits all resolve to a
/// terminal `failed` run rather than an error from `execute`.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The request was structurally invalid; nothing was spawned or written.
    #[error("Invalid submission request: {0}")]
    InvalidInput(String),

    /// The initial `running` record could not be written. The run cannot
    /// proceed without a traceable row.
    #[error("Failed to record submission run: {0}")]
    Database(#[from] DatabaseError),
}
