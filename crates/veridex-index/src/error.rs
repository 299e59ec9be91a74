//! Error types for index acquisition.

use std::time::Duration;

/// Acquisition errors. Per-source failures are absorbed by the scan
/// orchestrator into reason codes; these types classify what went wrong on
/// the way there.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Resource does not exist at the mirror.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Request failed at the transport level.
    #[error("network error: {message}")]
    Network { message: String },

    /// Request exceeded the configured per-retrieval timeout.
    #[error("timed out: {url}")]
    Timeout { url: String },

    /// Mirror asked us to back off.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Blob retrieved but could not be decompressed or decoded as text.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Decoded index digest does not match the signed manifest entry.
    #[error("index digest mismatch for {source_label}: expected {expected}, got {actual}")]
    DigestMismatch {
        source_label: String,
        expected: String,
        actual: String,
    },

    /// Detached signature failed authenticity verification.
    #[error("signature verification failed: {reason}")]
    SignatureInvalid { reason: String },

    /// Cache read or write failed.
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Configuration problem (bad URL, missing keyring, unreadable key).
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl IndexError {
    /// Whether a retry at the HTTP layer may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Result type for acquisition operations.
pub type IndexResult<T> = Result<T, IndexError>;
