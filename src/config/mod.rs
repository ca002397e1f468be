//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (throttle defaults, timeouts, limits)
//! - CLI option types and parsing
//! - Clamped per-job scanner settings

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, RunSettings, ScanOverrides, ScanSettings};
