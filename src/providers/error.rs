//! Errors returned by the upstream service clients.

/// Errors that can occur while talking to an upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Service unavailable ({status}): {message}")]
    ServerUnavailable {
        /// HTTP status returned by the gateway (502, 503 or 504)
        status: u16,
        message: String,
    },

    #[error("Rate limited: {message}")]
    RateLimit {
        /// Human-readable rate limit message
        message: String,
        /// Retry-After header value in seconds, if provided
        retry_after_secs: Option<u64>,
    },

    #[error("Network error: {message} (after {attempts} attempts)")]
    NetworkError {
        /// Human-readable network error message
        message: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },

    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Nothing to synthesize or translate")]
    EmptyText,

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
