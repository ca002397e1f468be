//! Configuration constants.
//!
//! Defaults and clamping ceilings for the batch scanner and the run
//! orchestrator. Callers may override the scanner knobs per request; every
//! override is clamped independently so one misbehaving caller cannot
//! stampede the downstream sites.

use std::time::Duration;

/// Targets scanned as one throttled unit before an inter-batch pause.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Ceiling for caller-supplied batch sizes.
pub const MAX_BATCH_SIZE: usize = 50;

/// Simultaneous in-flight scans within one batch.
pub const DEFAULT_CONCURRENT: usize = 3;
/// Ceiling for caller-supplied concurrency.
pub const MAX_CONCURRENT: usize = 10;

/// Delay between successive scan launches inside a batch.
pub const DEFAULT_PER_REQUEST_DELAY: Duration = Duration::from_millis(500);
/// Pause between batches within a chunk.
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(2000);
/// Ceiling for caller-supplied delays (per-request and inter-batch).
pub const MAX_DELAY: Duration = Duration::from_secs(30);

/// Above this many targets a job is split into chunks, separated by
/// `CHUNK_DELAY_FACTOR * inter_batch_delay` to de-load the target sites
/// during very large jobs. Not caller-overridable.
pub const CHUNK_SIZE: usize = 1000;
/// Multiplier applied to the inter-batch delay between chunks.
pub const CHUNK_DELAY_FACTOR: u32 = 3;

/// Hard wall-clock deadline for one automation process.
/// Headless-browser runs can legitimately take minutes on slow sites.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);
/// Grace period between the termination signal and the forceful kill.
/// Browser automation can hang on network waits that SIGTERM does not
/// interrupt promptly.
pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Maximum bytes captured per process output stream (10 MiB).
/// Output beyond this is truncated to bound memory per run.
pub const MAX_PROCESS_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// HTTP timeout for a single contact-page fetch.
pub const PROBE_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum HTML body size read per fetched page (2MB).
/// Larger responses are truncated before parsing to prevent memory exhaustion.
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Default SQLite database path.
pub const DB_PATH: &str = "./contact_sweep.db";

/// Default User-Agent for contact-page probes.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
