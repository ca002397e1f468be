// storage/mod.rs
// Database operations module

pub mod migrations;
pub mod pool;
pub mod runs;
pub mod targets;

// Re-export commonly used items
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use runs::{count_runs_with_status, fetch_run, finalize_run, insert_run, RunLinkage};
pub use targets::{count_rows, fetch_targets_by_ids, insert_target, record_scan_outcome};
