//! Resolution of a finished (or killed) automation process into a terminal
//! run outcome.

use serde_json::Value;

use crate::models::RunStatus;

use super::extract::extract_last_json_object;

/// What the process left behind, as captured by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ProcessCapture {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// The orchestrator's deadline fired before the process exited.
    pub timed_out: bool,
}

/// Terminal status and message for the run row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutcome {
    pub status: RunStatus,
    pub message: String,
}

/// Resolves captured process output into a terminal outcome.
///
/// The structured payload, when present, wins over the exit code: a non-zero
/// exit with a valid success object is still a success, because the
/// automation completed its task even if process teardown was noisy.
///
/// A deadline kill is different: the process never finished, so whatever
/// JSON its partial stdout happens to contain (a logged intermediate
/// result, say) must not be mistaken for the final verdict. Timeouts always
/// resolve to `failed`.
pub fn resolve_outcome(capture: &ProcessCapture) -> ResolvedOutcome {
    if capture.timed_out {
        return ResolvedOutcome {
            status: RunStatus::Failed,
            message: failure_message(capture, capture.exit_code),
        };
    }

    if let Some(payload) = extract_last_json_object(&capture.stdout) {
        return from_payload(&payload);
    }

    match capture.exit_code {
        Some(0) => {
            // A silent, well-behaved process is presumed to have succeeded.
            // One more attempt: the whole stdout may be a bare JSON document.
            if let Ok(payload @ Value::Object(_)) =
                serde_json::from_str::<Value>(capture.stdout.trim())
            {
                return from_payload(&payload);
            }
            let stdout = capture.stdout.trim();
            ResolvedOutcome {
                status: RunStatus::Success,
                message: if stdout.is_empty() {
                    "automation completed with no output".to_string()
                } else {
                    stdout.to_string()
                },
            }
        }
        code => ResolvedOutcome {
            status: RunStatus::Failed,
            message: failure_message(capture, code),
        },
    }
}

/// Builds the terminal record from the structured payload's `status` and
/// `message` fields. Any status other than "success" lands as `failed`; a
/// non-standard reported status is kept visible in the message.
fn from_payload(payload: &Value) -> ResolvedOutcome {
    let reported = payload
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("success");
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string());

    if reported.eq_ignore_ascii_case("success") {
        ResolvedOutcome {
            status: RunStatus::Success,
            message,
        }
    } else if reported.eq_ignore_ascii_case("failed") {
        ResolvedOutcome {
            status: RunStatus::Failed,
            message,
        }
    } else {
        ResolvedOutcome {
            status: RunStatus::Failed,
            message: format!("{reported}: {message}"),
        }
    }
}

/// Best-effort failure message for a run with no structured payload:
/// stderr, then stdout, then a generic exit-code line. Timeouts and signal
/// terminations are reported distinctly so they can be told apart from the
/// automation's own failures.
fn failure_message(capture: &ProcessCapture, code: Option<i32>) -> String {
    if capture.timed_out {
        return "automation timed out and was terminated".to_string();
    }
    let code = match code {
        Some(code) => code,
        None => return "automation was terminated by a signal".to_string(),
    };

    let stderr = capture.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = capture.stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }
    format!("process exited with code {code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(stdout: &str, stderr: &str, exit_code: Option<i32>) -> ProcessCapture {
        ProcessCapture {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            timed_out: false,
        }
    }

    #[test]
    fn payload_overrides_nonzero_exit() {
        let resolved = resolve_outcome(&capture(
            r#"shutting down{"status":"success","message":"ok"}"#,
            "teardown crashed",
            Some(1),
        ));
        assert_eq!(resolved.status, RunStatus::Success);
        assert_eq!(resolved.message, "ok");
    }

    #[test]
    fn payload_failure_is_reported_as_failed() {
        let resolved = resolve_outcome(&capture(
            r#"{"status":"failed","message":"no form found"}"#,
            "",
            Some(0),
        ));
        assert_eq!(resolved.status, RunStatus::Failed);
        assert_eq!(resolved.message, "no form found");
    }

    #[test]
    fn nonstandard_status_kept_in_message() {
        let resolved = resolve_outcome(&capture(
            r#"{"status":"captcha_blocked","message":"challenge shown"}"#,
            "",
            Some(0),
        ));
        assert_eq!(resolved.status, RunStatus::Failed);
        assert_eq!(resolved.message, "captcha_blocked: challenge shown");
    }

    #[test]
    fn silent_zero_exit_is_success_with_placeholder() {
        let resolved = resolve_outcome(&capture("", "", Some(0)));
        assert_eq!(resolved.status, RunStatus::Success);
        assert_eq!(resolved.message, "automation completed with no output");
    }

    #[test]
    fn chatty_zero_exit_is_success_with_stdout() {
        let resolved = resolve_outcome(&capture("all forms submitted\n", "", Some(0)));
        assert_eq!(resolved.status, RunStatus::Success);
        assert_eq!(resolved.message, "all forms submitted");
    }

    #[test]
    fn nonzero_exit_prefers_stderr() {
        let resolved = resolve_outcome(&capture("some logs", "browser crashed", Some(2)));
        assert_eq!(resolved.status, RunStatus::Failed);
        assert_eq!(resolved.message, "browser crashed");
    }

    #[test]
    fn nonzero_exit_falls_back_to_stdout_then_generic() {
        let resolved = resolve_outcome(&capture("only stdout", "", Some(3)));
        assert_eq!(resolved.message, "only stdout");

        let resolved = resolve_outcome(&capture("", "", Some(7)));
        assert_eq!(resolved.message, "process exited with code 7");
    }

    #[test]
    fn timeout_is_distinguishable() {
        let mut c = capture("partial output", "killed", None);
        c.timed_out = true;
        let resolved = resolve_outcome(&c);
        assert_eq!(resolved.status, RunStatus::Failed);
        assert!(resolved.message.contains("timed out"));
    }

    #[test]
    fn timeout_overrides_incidental_payload() {
        // A hung automation may have logged an intermediate result object
        // before the deadline fired; that is not a final verdict.
        let mut c = capture(
            r#"{"status":"success","message":"page loaded"}"#,
            "",
            None,
        );
        c.timed_out = true;
        let resolved = resolve_outcome(&c);
        assert_eq!(resolved.status, RunStatus::Failed);
        assert!(resolved.message.contains("timed out"));
    }

    #[test]
    fn signal_termination_without_timeout() {
        let resolved = resolve_outcome(&capture("", "", None));
        assert_eq!(resolved.status, RunStatus::Failed);
        assert!(resolved.message.contains("terminated by a signal"));
    }

    #[test]
    fn payload_without_message_uses_whole_object() {
        let resolved = resolve_outcome(&capture(r#"{"status":"success","fields":3}"#, "", Some(0)));
        assert_eq!(resolved.status, RunStatus::Success);
        assert!(resolved.message.contains("fields"));
    }
}
