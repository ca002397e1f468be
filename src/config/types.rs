//! Configuration types and CLI options.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Service configuration, parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "contact_sweep",
    about = "Bulk contact-page scanning and form-submission automation service"
)]
pub struct Config {
    /// Port for the HTTP API
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// SQLite database path
    #[arg(long, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Path to the external browser-automation executable
    #[arg(long, default_value = "auto-submit")]
    pub automation_bin: PathBuf,

    /// Hard deadline for one automation process, in seconds
    #[arg(long, default_value_t = DEFAULT_RUN_TIMEOUT.as_secs())]
    pub run_timeout_seconds: u64,

    /// HTTP User-Agent used by the contact-page probe
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from(DB_PATH),
            automation_bin: PathBuf::from("auto-submit"),
            run_timeout_seconds: DEFAULT_RUN_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

/// Throttling knobs for one scan job.
///
/// Built from the defaults and per-request caller overrides; every field is
/// clamped on construction, so a `ScanSettings` value is always safe to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub batch_size: usize,
    pub concurrent: usize,
    pub per_request_delay: Duration,
    pub inter_batch_delay: Duration,
}

/// Caller-supplied overrides from a scan request. Unset fields keep the
/// defaults; set fields are clamped by [`ScanSettings::with_overrides`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOverrides {
    pub batch_size: Option<usize>,
    pub concurrent: Option<usize>,
    pub per_request_delay_ms: Option<u64>,
    pub batch_delay_ms: Option<u64>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrent: DEFAULT_CONCURRENT,
            per_request_delay: DEFAULT_PER_REQUEST_DELAY,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
        }
    }
}

impl ScanSettings {
    /// Applies caller overrides, clamping each knob independently.
    pub fn with_overrides(overrides: ScanOverrides) -> Self {
        let defaults = Self::default();
        Self {
            batch_size: overrides
                .batch_size
                .unwrap_or(defaults.batch_size)
                .clamp(1, MAX_BATCH_SIZE),
            concurrent: overrides
                .concurrent
                .unwrap_or(defaults.concurrent)
                .clamp(1, MAX_CONCURRENT),
            per_request_delay: overrides
                .per_request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_request_delay)
                .min(MAX_DELAY),
            inter_batch_delay: overrides
                .batch_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.inter_batch_delay)
                .min(MAX_DELAY),
        }
    }

    /// Pause inserted between chunks of very large jobs.
    pub fn inter_chunk_delay(&self) -> Duration {
        self.inter_batch_delay * CHUNK_DELAY_FACTOR
    }
}

/// Deadline configuration for the run orchestrator.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Executable invoked once per submission run.
    pub automation_bin: PathBuf,
    /// Wall-clock deadline armed at process launch.
    pub timeout: Duration,
    /// Grace period between SIGTERM and the forceful kill.
    pub kill_grace: Duration,
}

impl RunSettings {
    pub fn new(automation_bin: PathBuf, timeout: Duration) -> Self {
        Self {
            automation_bin,
            timeout,
            kill_grace: KILL_GRACE_PERIOD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_settings_defaults() {
        let settings = ScanSettings::default();
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.concurrent, 3);
        assert_eq!(settings.per_request_delay, Duration::from_millis(500));
        assert_eq!(settings.inter_batch_delay, Duration::from_millis(2000));
    }

    #[test]
    fn overrides_are_clamped_independently() {
        let settings = ScanSettings::with_overrides(ScanOverrides {
            batch_size: Some(500),
            concurrent: Some(100),
            per_request_delay_ms: Some(120_000),
            batch_delay_ms: Some(600_000),
        });
        assert_eq!(settings.batch_size, MAX_BATCH_SIZE);
        assert_eq!(settings.concurrent, MAX_CONCURRENT);
        assert_eq!(settings.per_request_delay, MAX_DELAY);
        assert_eq!(settings.inter_batch_delay, MAX_DELAY);
    }

    #[test]
    fn per_request_delay_is_overridable() {
        let settings = ScanSettings::with_overrides(ScanOverrides {
            per_request_delay_ms: Some(50),
            ..Default::default()
        });
        assert_eq!(settings.per_request_delay, Duration::from_millis(50));
        assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_overrides_are_raised_to_one() {
        let settings = ScanSettings::with_overrides(ScanOverrides {
            batch_size: Some(0),
            concurrent: Some(0),
            ..Default::default()
        });
        assert_eq!(settings.batch_size, 1);
        assert_eq!(settings.concurrent, 1);
        assert_eq!(settings.inter_batch_delay, DEFAULT_INTER_BATCH_DELAY);
    }

    #[test]
    fn inter_chunk_delay_is_triple_inter_batch() {
        let settings = ScanSettings::with_overrides(ScanOverrides {
            batch_delay_ms: Some(100),
            ..Default::default()
        });
        assert_eq!(settings.inter_chunk_delay(), Duration::from_millis(300));
    }

    #[test]
    fn log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }
}
