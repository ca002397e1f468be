//! Application initialization and resource setup.
//!
//! Provides constructors for the shared resources the service wires together
//! at startup: the logger, the probe's HTTP client, and the database pool
//! (see `storage::init_db_pool_with_path`).

mod client;
mod logger;

pub use client::init_probe_client;
pub use logger::init_logger_with;
