//! Retry and backoff utilities for provider calls.
//!
//! Transient network errors, gateway errors and rate limits are retried with
//! exponential backoff. Everything else fails immediately so the caller's
//! fallback chain can take over.

use std::future::Future;
use std::time::Duration;

use super::ProviderError;
use crate::config::NetworkConfig;

/// Base delay for exponential backoff (500 milliseconds).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum delay cap for exponential backoff (10 seconds).
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// How many times, and how patiently, a provider call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for RetryPolicy {
    fn from(network: &NetworkConfig) -> Self {
        Self::new(network.retries)
    }
}

/// Determine if a reqwest error is a transient network error that should be retried.
///
/// Returns true for connection errors, timeouts, and other temporary failures.
/// Returns false for errors that are unlikely to resolve on retry.
pub fn is_transient_network_error(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() || error.is_body() {
        return true;
    }

    // 502 Bad Gateway, 503 Service Unavailable, 504 Gateway Timeout
    if let Some(status) = error.status() {
        if matches!(status.as_u16(), 502..=504) {
            return true;
        }
    }

    false
}

fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::HttpError(http_err) => is_transient_network_error(http_err),
        ProviderError::RateLimit { .. } | ProviderError::ServerUnavailable { .. } => true,
        _ => false,
    }
}

/// Parse the Retry-After header value to get retry delay in seconds.
///
/// Only the integer seconds format is understood; HTTP dates yield None.
pub fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Calculate exponential backoff delay with jitter.
///
/// Uses the formula: min(base * 2^attempt + jitter, max_delay)
/// where jitter is half the base, capped at 500ms.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_ms = (base.as_millis() as u64).min(1000);
    let jitter = Duration::from_millis(jitter_ms / 2);
    exponential.saturating_add(jitter).min(max)
}

/// Run `attempt_fn` until it succeeds, fails with a non-retryable error, or
/// the policy's retries are exhausted.
///
/// A transient `HttpError` that exhausts its retries is reported as
/// `NetworkError` with the attempt count; rate limits and gateway errors are
/// returned as-is.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt_fn: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;

    loop {
        let error = match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) => e,
            Err(e) => return Err(e),
        };

        if attempt >= policy.max_retries {
            log::error!(
                "{} failed after {} attempts. Giving up. Error: {}",
                operation,
                attempt + 1,
                error
            );
            return Err(match error {
                ProviderError::HttpError(http_err) => ProviderError::NetworkError {
                    message: http_err.to_string(),
                    attempts: attempt + 1,
                },
                other => other,
            });
        }

        let delay = match &error {
            ProviderError::RateLimit {
                retry_after_secs: Some(secs),
                ..
            } => Duration::from_secs(*secs).min(policy.backoff_max),
            _ => calculate_backoff(attempt, policy.backoff_base, policy.backoff_max),
        };

        log::warn!(
            "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
            operation,
            attempt + 1,
            policy.max_retries + 1,
            error,
            delay
        );

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
