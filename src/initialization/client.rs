//! HTTP client initialization for the contact-page probe.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

/// Initializes the shared HTTP client used by the contact-page probe.
///
/// Creates a `reqwest::Client` configured with:
/// - the configured User-Agent header
/// - a per-request timeout
/// - redirect following enabled (reqwest's default, up to 10 hops)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_probe_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent.to_string())
        .build()?;
    Ok(Arc::new(client))
}
