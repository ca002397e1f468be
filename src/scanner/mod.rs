//! Batch Scanner: fans a set of targets out through the contact-page probe
//! under a three-level throttle.
//!
//! The pipeline is chunks → batches → concurrency groups:
//! - very large jobs are split into chunks of [`CHUNK_SIZE`] targets,
//!   separated by `3 × inter_batch_delay`;
//! - each chunk is processed in batches of `batch_size`, separated by
//!   `inter_batch_delay`;
//! - within a batch, targets run in groups of `concurrent`; group members
//!   after the first are staggered by successive multiples of
//!   `per_request_delay`, and the whole group is awaited before the next
//!   group starts.
//!
//! Every completed scan is persisted immediately, so a crash mid-job loses
//! only the unfinished remainder. A single target failing — in the probe or
//! in persistence — never aborts the batch, the chunk, or the job.

mod dispatch;

pub use dispatch::{dispatch_scan, ScanDispatch};

use std::sync::Arc;

use futures::future::join_all;
use log::{info, warn};
use sqlx::SqlitePool;

use crate::config::{ScanSettings, CHUNK_SIZE};
use crate::models::{ScanCounters, ScanJobReport, ScanOutcome, Target};
use crate::probe::ContactProbe;
use crate::storage::record_scan_outcome;

/// Scans targets for usable contact pages and persists each outcome.
pub struct BatchScanner<P: ContactProbe> {
    probe: P,
    pool: Arc<SqlitePool>,
    settings: ScanSettings,
}

impl<P: ContactProbe> BatchScanner<P> {
    pub fn new(probe: P, pool: Arc<SqlitePool>, settings: ScanSettings) -> Self {
        Self {
            probe,
            pool,
            settings,
        }
    }

    pub fn settings(&self) -> ScanSettings {
        self.settings
    }

    /// Scans one target and records the outcome.
    ///
    /// The probe is infallible by contract; a persistence failure is logged
    /// and skipped so the job can continue with the next target.
    pub async fn scan_and_record(&self, target: &Target) -> ScanOutcome {
        let outcome = self.probe.scan(&target.url).await;

        if let Err(e) = record_scan_outcome(&self.pool, target, &outcome).await {
            warn!(
                "Failed to persist scan outcome for {} (continuing): {e}",
                target.url
            );
        }

        outcome
    }

    /// Runs the full chunk → batch → group pipeline over `targets`.
    ///
    /// Returns aggregated counters; per-target detail lives in the
    /// `contact_checks` rows written along the way.
    pub async fn run_job(&self, targets: &[Target]) -> ScanJobReport {
        let total = targets.len();
        let start = std::time::Instant::now();
        let mut counters = ScanCounters::default();

        let chunk_count = total.div_ceil(CHUNK_SIZE).max(1);
        if chunk_count > 1 {
            info!(
                "Large job: {total} targets split into {chunk_count} chunks of at most {CHUNK_SIZE}"
            );
        }

        for (chunk_index, chunk) in targets.chunks(CHUNK_SIZE).enumerate() {
            if chunk_index > 0 {
                tokio::time::sleep(self.settings.inter_chunk_delay()).await;
            }
            self.run_chunk(chunk, &mut counters).await;
            info!(
                "Chunk {}/{} done: {}/{} targets scanned ({} found, {} errors)",
                chunk_index + 1,
                chunk_count,
                counters.checked,
                total,
                counters.found,
                counters.errors
            );
        }

        ScanJobReport {
            total,
            counters,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        }
    }

    /// Processes one chunk as a sequence of throttled batches.
    async fn run_chunk(&self, chunk: &[Target], counters: &mut ScanCounters) {
        for (batch_index, batch) in chunk.chunks(self.settings.batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.settings.inter_batch_delay).await;
            }
            self.run_batch(batch, counters).await;
        }
    }

    /// Processes one batch in concurrency-limited groups.
    ///
    /// Outcome persistence order within a group is unspecified; the group
    /// runs concurrently and is awaited as a whole.
    async fn run_batch(&self, batch: &[Target], counters: &mut ScanCounters) {
        for group in batch.chunks(self.settings.concurrent) {
            let scans = group.iter().enumerate().map(|(position, target)| {
                let stagger = self.settings.per_request_delay * position as u32;
                async move {
                    if position > 0 {
                        tokio::time::sleep(stagger).await;
                    }
                    self.scan_and_record(target).await
                }
            });

            for outcome in join_all(scans).await {
                counters.record(outcome.status);
            }
        }
    }
}
