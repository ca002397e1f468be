//! Core domain types shared by the scanner, the run orchestrator, and storage.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// Classification of one contact-page scan attempt.
///
/// Stored as lowercase snake_case text in the `contact_checks` table and on
/// the owning target's current-status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIterMacro)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// A usable contact/submission page was found.
    Found,
    /// No contact page could be located on the site.
    NotFound,
    /// A contact page exists but carries no submittable form.
    NoForm,
    /// The scan itself failed (network error, invalid response, ...).
    Error,
}

impl ContactStatus {
    /// Database/text representation; matches the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Found => "found",
            ContactStatus::NotFound => "not_found",
            ContactStatus::NoForm => "no_form",
            ContactStatus::Error => "error",
        }
    }

    /// Parses the database representation back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "found" => Some(ContactStatus::Found),
            "not_found" => Some(ContactStatus::NotFound),
            "no_form" => Some(ContactStatus::NoForm),
            "error" => Some(ContactStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of a single contact-page scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub status: ContactStatus,
    /// Resolved contact-page URL, if one was found.
    pub contact_url: Option<String>,
    pub message: String,
}

impl ScanOutcome {
    pub fn found(contact_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ContactStatus::Found,
            contact_url: Some(contact_url.into()),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: ContactStatus::NotFound,
            contact_url: None,
            message: message.into(),
        }
    }

    pub fn no_form(message: impl Into<String>) -> Self {
        Self {
            status: ContactStatus::NoForm,
            contact_url: None,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ContactStatus::Error,
            contact_url: None,
            message: message.into(),
        }
    }
}

/// A domain/URL under bulk scanning.
///
/// Ad-hoc URLs submitted directly in a scan request have no `id`; their
/// outcomes are still appended to the audit log, but there is no target row
/// to carry current-status fields.
#[derive(Debug, Clone)]
pub struct Target {
    pub id: Option<i64>,
    pub url: String,
    pub category: Option<String>,
}

impl Target {
    /// Wraps a raw URL into an ad-hoc target with no persistent row.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            category: None,
        }
    }
}

/// Lifecycle state of a submission run. Transitions only forward:
/// `running` is written at creation, exactly one terminal update follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation of the external form-submission automation, as persisted
/// in the `submission_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionRun {
    pub id: i64,
    pub url: String,
    pub status: String,
    pub message: String,
    pub domain_id: Option<i64>,
    pub template_id: Option<i64>,
    pub operator_id: Option<i64>,
    pub created_at: i64,
    pub finished_at: Option<i64>,
}

/// Aggregated per-status tallies for one scan job.
///
/// Invariant: `checked` always equals the sum of the four status counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounters {
    pub checked: usize,
    pub found: usize,
    pub not_found: usize,
    pub no_form: usize,
    pub errors: usize,
}

impl ScanCounters {
    /// Records one completed scan in the tally.
    pub fn record(&mut self, status: ContactStatus) {
        self.checked += 1;
        match status {
            ContactStatus::Found => self.found += 1,
            ContactStatus::NotFound => self.not_found += 1,
            ContactStatus::NoForm => self.no_form += 1,
            ContactStatus::Error => self.errors += 1,
        }
    }
}

/// Summary returned by a completed scan job.
#[derive(Debug, Clone)]
pub struct ScanJobReport {
    /// Number of targets the job was asked to scan.
    pub total: usize,
    pub counters: ScanCounters,
    pub elapsed_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn contact_status_text_round_trips() {
        for status in ContactStatus::iter() {
            assert_eq!(
                ContactStatus::parse(status.as_str()),
                Some(status),
                "round trip failed for {status}"
            );
        }
        assert_eq!(ContactStatus::parse("bogus"), None);
    }

    #[test]
    fn counters_sum_matches_checked() {
        let mut counters = ScanCounters::default();
        for status in [
            ContactStatus::Found,
            ContactStatus::Found,
            ContactStatus::NotFound,
            ContactStatus::NoForm,
            ContactStatus::Error,
        ] {
            counters.record(status);
        }
        assert_eq!(counters.checked, 5);
        assert_eq!(
            counters.checked,
            counters.found + counters.not_found + counters.no_form + counters.errors
        );
    }

    #[test]
    fn run_status_transitions_forward_only() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Success.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn scan_outcome_serializes_camel_case() {
        let outcome = ScanOutcome::found("https://example.com/contact", "ok");
        let json = serde_json::to_value(&outcome).expect("serialize outcome");
        assert_eq!(json["status"], "found");
        assert_eq!(json["contactUrl"], "https://example.com/contact");
    }
}
