//! Run Orchestrator: one external automation process per submission, with a
//! hard deadline, escalating termination, and robust result extraction.
//!
//! A run's lifecycle:
//! 1. validate the request (nothing is written for malformed input)
//! 2. insert the `running` row, so even an aborted process stays traceable
//! 3. write the field-mapping template into a private temp directory
//! 4. spawn the automation executable with the URL and template path
//! 5. wait up to the deadline; on expiry send SIGTERM, and if the process
//!    is still alive after the grace period, SIGKILL it
//! 6. resolve the captured output into a terminal status (see [`outcome`])
//! 7. finalize the row exactly once
//!
//! The temp directory is removed on every exit path (it is dropped with the
//! attempt), and spawn failures, timeouts, and non-zero exits all land as a
//! terminal `failed` row rather than an error to the caller.

mod extract;
mod outcome;

pub use extract::extract_last_json_object;
pub use outcome::{resolve_outcome, ProcessCapture, ResolvedOutcome};

use std::process::Stdio;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use url::Url;

use crate::config::{RunSettings, MAX_PROCESS_OUTPUT_BYTES};
use crate::error_handling::OrchestratorError;
use crate::models::RunStatus;
use crate::storage::{finalize_run, insert_run, RunLinkage};

/// A validated request to run the automation once against a URL.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub url: String,
    /// Field-mapping template handed to the automation as a JSON file.
    pub template: Value,
    pub linkage: RunLinkage,
}

/// Terminal result of one submission attempt.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: i64,
    pub status: RunStatus,
    pub message: String,
}

/// Executes submission runs against the external automation executable.
pub struct RunOrchestrator {
    pool: Arc<SqlitePool>,
    settings: RunSettings,
}

impl RunOrchestrator {
    pub fn new(pool: Arc<SqlitePool>, settings: RunSettings) -> Self {
        Self { pool, settings }
    }

    /// Runs one submission attempt end to end.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for malformed requests (no side effects), `Database`
    /// when the run row cannot be written. Everything the process itself
    /// does wrong resolves into the returned report instead.
    pub async fn execute(&self, request: SubmissionRequest) -> Result<RunReport, OrchestratorError> {
        validate(&request)?;

        let run_id = insert_run(&self.pool, &request.url, request.linkage).await?;
        info!("Run {run_id}: starting automation for {}", request.url);

        let resolved = match self.attempt(&request, run_id).await {
            Ok(resolved) => resolved,
            Err(e) => ResolvedOutcome {
                status: RunStatus::Failed,
                message: format!("automation could not be started: {e}"),
            },
        };

        finalize_run(&self.pool, run_id, resolved.status, &resolved.message).await?;
        info!(
            "Run {run_id}: finished with status {} ({})",
            resolved.status, resolved.message
        );

        Ok(RunReport {
            run_id,
            status: resolved.status,
            message: resolved.message,
        })
    }

    /// Spawns the process and resolves its output.
    ///
    /// Only infrastructure failures (temp dir, template write, spawn) come
    /// back as `Err`; the caller records them as a failed run.
    async fn attempt(
        &self,
        request: &SubmissionRequest,
        run_id: i64,
    ) -> Result<ResolvedOutcome, std::io::Error> {
        // Uniquely-named directory per run; dropped (and deleted) on every
        // exit path out of this function.
        let temp_dir = tempfile::Builder::new()
            .prefix("contact-sweep-run-")
            .tempdir()?;
        let template_path = temp_dir.path().join("template.json");
        let template_bytes =
            serde_json::to_vec_pretty(&request.template).map_err(std::io::Error::other)?;
        tokio::fs::write(&template_path, template_bytes).await?;

        let mut child = Command::new(&self.settings.automation_bin)
            .arg(&request.url)
            .arg(&template_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Drain both streams concurrently so child.wait() stays available.
        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();
        let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
        let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

        let mut timed_out = false;
        let status = match tokio::time::timeout(self.settings.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                timed_out = true;
                warn!(
                    "Run {run_id}: deadline of {:?} expired, sending termination signal",
                    self.settings.timeout
                );
                send_term_signal(&child, run_id);

                match tokio::time::timeout(self.settings.kill_grace, child.wait()).await {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!(
                            "Run {run_id}: process survived the {:?} grace period, killing it",
                            self.settings.kill_grace
                        );
                        child.kill().await?;
                        child.wait().await?
                    }
                }
            }
        };

        let stdout_bytes = stdout_task.await.unwrap_or_default();
        let stderr_bytes = stderr_task.await.unwrap_or_default();
        let capture = ProcessCapture {
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            exit_code: status.code(),
            timed_out,
        };
        debug!(
            "Run {run_id}: process exited (code {:?}, {} stdout bytes, {} stderr bytes)",
            capture.exit_code,
            capture.stdout.len(),
            capture.stderr.len()
        );

        Ok(resolve_outcome(&capture))
    }
}

/// Rejects structurally invalid requests before any side effect.
fn validate(request: &SubmissionRequest) -> Result<(), OrchestratorError> {
    if request.url.trim().is_empty() {
        return Err(OrchestratorError::InvalidInput("url is required".into()));
    }
    if Url::parse(&request.url).is_err() {
        return Err(OrchestratorError::InvalidInput(format!(
            "url is not valid: {}",
            request.url
        )));
    }
    if !request.template.is_object() {
        return Err(OrchestratorError::InvalidInput(
            "template must be a JSON object".into(),
        ));
    }
    Ok(())
}

/// Sends the graceful termination signal. The forceful kill follows
/// separately if the process ignores it.
#[cfg(unix)]
fn send_term_signal(child: &Child, run_id: i64) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!("Run {run_id}: failed to send SIGTERM to pid {pid}: {e}");
            }
        }
        None => debug!("Run {run_id}: process already reaped before SIGTERM"),
    }
}

/// No graceful signal on this platform; the grace period simply delays the
/// forceful kill.
#[cfg(not(unix))]
fn send_term_signal(_child: &Child, _run_id: i64) {}

/// Reads an output stream to EOF, capped at [`MAX_PROCESS_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_PROCESS_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, template: Value) -> SubmissionRequest {
        SubmissionRequest {
            url: url.to_string(),
            template,
            linkage: RunLinkage::default(),
        }
    }

    #[test]
    fn validate_rejects_empty_url() {
        let err = validate(&request("  ", serde_json::json!({}))).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidInput(_)));
    }

    #[test]
    fn validate_rejects_unparseable_url() {
        let err = validate(&request("not a url", serde_json::json!({}))).unwrap_err();
        assert!(err.to_string().contains("not valid"));
    }

    #[test]
    fn validate_rejects_non_object_template() {
        let err = validate(&request("https://example.com", serde_json::json!([1, 2]))).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        let req = request(
            "https://example.com/contact",
            serde_json::json!({"name": "#name"}),
        );
        assert!(validate(&req).is_ok());
    }
}
