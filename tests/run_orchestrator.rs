// Run orchestrator tests against real shell scripts standing in for the
// automation executable. Unix-only: the scripts and the termination signal
// path both assume a POSIX shell.

#![cfg(unix)]

mod helpers;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use contact_sweep::config::RunSettings;
use contact_sweep::initialization::init_probe_client;
use contact_sweep::models::RunStatus;
use contact_sweep::runner::{RunOrchestrator, SubmissionRequest};
use contact_sweep::server::{build_router, AppState};
use contact_sweep::storage::RunLinkage;

use helpers::create_test_db;

/// Writes an executable shell script into `dir`.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("make script executable");
    path
}

fn orchestrator(pool: sqlx::SqlitePool, bin: PathBuf, timeout: Duration) -> RunOrchestrator {
    RunOrchestrator::new(
        Arc::new(pool),
        RunSettings {
            automation_bin: bin,
            timeout,
            kill_grace: Duration::from_millis(300),
        },
    )
}

fn request(url: &str) -> SubmissionRequest {
    SubmissionRequest {
        url: url.to_string(),
        template: serde_json::json!({"name": "#name", "message": "#message"}),
        linkage: RunLinkage::default(),
    }
}

async fn fetch_row(pool: &sqlx::SqlitePool, run_id: i64) -> (String, String, Option<i64>) {
    sqlx::query_as::<_, (String, String, Option<i64>)>(
        "SELECT status, message, finished_at FROM submission_runs WHERE id = ?",
    )
    .bind(run_id)
    .fetch_one(pool)
    .await
    .expect("fetch run row")
}

#[tokio::test]
async fn success_payload_overrides_nonzero_exit() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    let bin = write_script(
        scripts.path(),
        "noisy-success.sh",
        "echo 'launching browser'\n\
         echo '{\"status\":\"success\",\"message\":\"submitted\"}'\n\
         exit 1\n",
    );

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_secs(10));
    let report = runner
        .execute(request("https://example.com/contact"))
        .await
        .expect("run should complete");

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.message, "submitted");

    let (status, message, finished_at) = fetch_row(&db.pool, report.run_id).await;
    assert_eq!(status, "success");
    assert_eq!(message, "submitted");
    assert!(finished_at.is_some(), "run must be finalized");
}

#[tokio::test]
async fn url_and_template_path_are_passed_to_the_process() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    // Fails fast unless $2 points at a readable template file.
    let bin = write_script(
        scripts.path(),
        "check-args.sh",
        "test -s \"$2\" || exit 9\n\
         echo \"{\\\"status\\\":\\\"success\\\",\\\"message\\\":\\\"target $1\\\"}\"\n",
    );

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_secs(10));
    let report = runner
        .execute(request("https://example.com/contact"))
        .await
        .expect("run should complete");

    assert_eq!(report.status, RunStatus::Success);
    assert!(
        report.message.contains("https://example.com/contact"),
        "message should carry the url: {}",
        report.message
    );
}

#[tokio::test]
async fn hung_process_is_terminated_at_the_deadline() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    // exec so the spawned pid is the sleep itself; a forked child would
    // outlive the shell and keep the output pipes open.
    let bin = write_script(scripts.path(), "hang.sh", "exec sleep 30\n");

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_millis(300));
    let started = std::time::Instant::now();
    let report = runner
        .execute(request("https://example.com"))
        .await
        .expect("run should complete");
    let elapsed = started.elapsed();

    assert_eq!(report.status, RunStatus::Failed);
    assert!(
        report.message.contains("timed out"),
        "timeout must be distinguishable: {}",
        report.message
    );
    // Deadline + grace with slack; nowhere near the script's 30s sleep.
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");

    let (status, _, finished_at) = fetch_row(&db.pool, report.run_id).await;
    assert_eq!(status, "failed");
    assert!(finished_at.is_some());
}

#[tokio::test]
async fn sigterm_immune_process_is_killed_after_the_grace_period() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    // Ignored TERM survives the exec, so only the SIGKILL path can end this.
    let bin = write_script(scripts.path(), "stubborn.sh", "trap '' TERM\nexec sleep 30\n");

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_millis(300));
    let started = std::time::Instant::now();
    let report = runner
        .execute(request("https://example.com"))
        .await
        .expect("run should complete");
    let elapsed = started.elapsed();

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.message.contains("timed out"));
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

#[tokio::test]
async fn silent_zero_exit_is_recorded_as_success() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    let bin = write_script(scripts.path(), "silent.sh", "exit 0\n");

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_secs(10));
    let report = runner
        .execute(request("https://example.com"))
        .await
        .expect("run should complete");

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.message, "automation completed with no output");
}

#[tokio::test]
async fn unstructured_failure_reports_stderr() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    let bin = write_script(
        scripts.path(),
        "crash.sh",
        "echo 'navigating' \necho 'browser crashed' >&2\nexit 3\n",
    );

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_secs(10));
    let report = runner
        .execute(request("https://example.com"))
        .await
        .expect("run should complete");

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.message, "browser crashed");
}

#[tokio::test]
async fn invalid_input_is_rejected_without_side_effects() {
    let db = create_test_db().await;
    let runner = orchestrator(
        db.pool.clone(),
        PathBuf::from("/bin/true"),
        Duration::from_secs(10),
    );

    let mut bad = request("https://example.com");
    bad.url = "   ".to_string();
    assert!(runner.execute(bad).await.is_err());

    let mut bad = request("https://example.com");
    bad.template = serde_json::json!("not an object");
    assert!(runner.execute(bad).await.is_err());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submission_runs")
        .fetch_one(&db.pool)
        .await
        .expect("count runs");
    assert_eq!(rows, 0, "rejected requests must leave no rows");
}

#[tokio::test]
async fn missing_executable_resolves_to_a_failed_run() {
    let db = create_test_db().await;
    let runner = orchestrator(
        db.pool.clone(),
        PathBuf::from("/nonexistent/auto-submit"),
        Duration::from_secs(10),
    );

    let report = runner
        .execute(request("https://example.com"))
        .await
        .expect("spawn failure still resolves the run");

    assert_eq!(report.status, RunStatus::Failed);
    assert!(
        report.message.contains("could not be started"),
        "unexpected message: {}",
        report.message
    );
    let (status, _, finished_at) = fetch_row(&db.pool, report.run_id).await;
    assert_eq!(status, "failed");
    assert!(finished_at.is_some());
}

#[tokio::test]
async fn finished_runs_are_pollable_over_http() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    let bin = write_script(
        scripts.path(),
        "ok.sh",
        "echo '{\"status\":\"success\",\"message\":\"submitted\"}'\n",
    );

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_secs(10));
    let report = runner
        .execute(request("https://example.com/contact"))
        .await
        .expect("run should complete");

    let router = build_router(AppState {
        pool: Arc::new(db.pool.clone()),
        probe_client: init_probe_client("contact-sweep-tests", Duration::from_secs(1))
            .expect("probe client"),
        runner: Arc::new(runner),
    });

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/submissions/{}", report.run_id))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["runId"], report.run_id);
    assert_eq!(body["status"], "success");
    assert_eq!(body["url"], "https://example.com/contact");
    assert!(body["finishedAt"].is_i64(), "finalized run has a timestamp");

    // Unknown ids are a 404, not an internal error.
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/submissions/999999")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn runs_are_finalized_exactly_once() {
    let db = create_test_db().await;
    let scripts = tempfile::tempdir().expect("script dir");
    let bin = write_script(
        scripts.path(),
        "ok.sh",
        "echo '{\"status\":\"success\",\"message\":\"first\"}'\n",
    );

    let runner = orchestrator(db.pool.clone(), bin, Duration::from_secs(10));
    let report = runner
        .execute(request("https://example.com"))
        .await
        .expect("run should complete");

    // A duplicate finalize matches no rows and must not clobber the result.
    contact_sweep::storage::finalize_run(&db.pool, report.run_id, RunStatus::Failed, "late update")
        .await
        .expect("duplicate finalize is not an error");

    let (status, message, _) = fetch_row(&db.pool, report.run_id).await;
    assert_eq!(status, "success");
    assert_eq!(message, "first");
}
