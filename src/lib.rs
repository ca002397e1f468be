//! contact_sweep library: bulk contact-page scanning and form-submission
//! automation.
//!
//! Two cooperating engines over a SQLite store:
//!
//! - the **batch scanner** checks large sets of domains for a usable
//!   contact/submission page under a three-level throttle (per-request
//!   stagger, per-batch concurrency cap, inter-batch and inter-chunk
//!   delays), persisting every outcome as it completes;
//! - the **run orchestrator** drives one external headless-browser
//!   automation process per submission, with a hard deadline, escalating
//!   termination, and result extraction from unstructured output.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use contact_sweep::config::ScanSettings;
//! use contact_sweep::models::Target;
//! use contact_sweep::probe::HttpContactProbe;
//! use contact_sweep::scanner::BatchScanner;
//! use contact_sweep::storage::init_db_pool_with_path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_db_pool_with_path(std::path::Path::new("./contact_sweep.db")).await?;
//! contact_sweep::storage::run_migrations(&pool).await?;
//!
//! let probe = HttpContactProbe::new(Arc::new(reqwest::Client::new()));
//! let scanner = BatchScanner::new(probe, pool, ScanSettings::default());
//! let report = scanner.run_job(&[Target::from_url("https://example.com")]).await;
//! println!("{} checked, {} found", report.counters.checked, report.counters.found);
//! # Ok(())
//! # }
//! ```
//!
//! This library requires a Tokio runtime.

pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod models;
pub mod probe;
pub mod runner;
pub mod scanner;
pub mod server;
pub mod storage;

// Re-export the types most callers need.
pub use config::{Config, LogFormat, LogLevel, RunSettings, ScanOverrides, ScanSettings};
pub use models::{ContactStatus, RunStatus, ScanCounters, ScanJobReport, ScanOutcome, Target};
pub use runner::{RunOrchestrator, RunReport, SubmissionRequest};
pub use scanner::{dispatch_scan, BatchScanner, ScanDispatch};
