//! Synchronous-vs-background dispatch for scan requests.
//!
//! A single-target request is answered inline; anything larger is
//! acknowledged immediately and the job runs on a spawned task, because a
//! thousand-target scan can run for hours and no interactive request should
//! block on it. Completion is observed only through the persisted rows.

use std::sync::Arc;

use log::{info, warn};

use crate::models::{ScanOutcome, Target};
use crate::probe::ContactProbe;

use super::BatchScanner;

/// How a scan request was handled.
#[derive(Debug)]
pub enum ScanDispatch {
    /// Exactly one target: scanned synchronously, outcome returned inline.
    Completed(ScanOutcome),
    /// More than one target: job accepted and running in the background.
    Accepted { total: usize },
}

/// Routes a validated target list to the inline or background path.
///
/// Once this returns `Accepted`, the job runs to completion; there is no
/// cancellation hook short of process shutdown.
pub async fn dispatch_scan<P>(scanner: Arc<BatchScanner<P>>, targets: Vec<Target>) -> ScanDispatch
where
    P: ContactProbe + 'static,
{
    if targets.len() == 1 {
        let outcome = scanner.scan_and_record(&targets[0]).await;
        return ScanDispatch::Completed(outcome);
    }

    let total = targets.len();
    info!("Accepted scan job for {total} targets; processing in background");

    tokio::spawn(async move {
        let report = scanner.run_job(&targets).await;
        let c = report.counters;
        if c.checked != report.total {
            warn!(
                "Scan job finished with {} of {} targets checked",
                c.checked, report.total
            );
        }
        info!(
            "Scan job complete: {} checked in {:.1}s ({} found, {} not_found, {} no_form, {} errors)",
            c.checked, report.elapsed_seconds, c.found, c.not_found, c.no_form, c.errors
        );
    });

    ScanDispatch::Accepted { total }
}
