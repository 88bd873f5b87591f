//! Clients for the upstream services: stock-photo search, premium and free
//! speech synthesis, and machine translation.
//!
//! Each client is a thin HTTP wrapper that returns `Result<_, ProviderError>`.
//! Fallback policy lives in the generators, not here.

mod error;
mod free_voice;
mod photo;
mod premium_voice;
mod retry;
mod translation;

use std::time::Duration;

pub use error::ProviderError;
pub use free_voice::{split_text, FreeVoiceClient, MAX_CHUNK_CHARS};
pub use photo::{PhotoSearchClient, RandomPhoto};
pub use premium_voice::PremiumVoiceClient;
pub use retry::{
    calculate_backoff, is_transient_network_error, with_retry, RetryPolicy, DEFAULT_BACKOFF_BASE,
    DEFAULT_BACKOFF_MAX,
};
pub use translation::TranslationClient;

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an HTTP client with the given overall request timeout.
fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
        .user_agent(concat!("media-studio/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Map a non-success response to the matching `ProviderError`.
///
/// 429 becomes `RateLimit`, 502/503/504 become `ServerUnavailable`, anything
/// else becomes `ApiError` carrying the status and body.
async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 429 {
        let retry_after_secs = retry::parse_retry_after(&response);
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Rate limit exceeded".to_string());
        log::warn!(
            "{} rate limited. Retry-After: {:?} seconds",
            what,
            retry_after_secs
        );
        return Err(ProviderError::RateLimit {
            message,
            retry_after_secs,
        });
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if matches!(status.as_u16(), 502..=504) {
        return Err(ProviderError::ServerUnavailable {
            status: status.as_u16(),
            message: body,
        });
    }

    Err(ProviderError::ApiError(format!(
        "{} failed with status {}: {}",
        what, status, body
    )))
}
