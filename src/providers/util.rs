use crate::core::upstream::UpstreamError;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

/// Timeout for price and news requests.
pub const FEED_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for text completion requests.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds an HTTP client whose requests give up after `timeout`.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("coindash/0.1")
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Sends a request once and maps non-2xx statuses to an [`UpstreamError`].
pub async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "Upstream rejected request");
    Err(UpstreamError::from_status(status.as_u16()))
}
