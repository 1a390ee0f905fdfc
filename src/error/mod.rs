//! Error taxonomy for the Platewise client.
//!
//! Two domain enums cover the failure surfaces that need policy decisions:
//!
//! - [`NetworkError`] - transport and HTTP-status failures around a request
//! - [`StreamError`] - failures inside an open event stream
//!
//! [`PlatewiseError`] unifies them (plus raw reqwest/serde errors) for the
//! client API surface. Retry policy is deliberately conservative: nothing is
//! retried automatically; `is_retryable()` only informs the caller's retry
//! affordance.

mod network;
mod stream;

pub use network::{classify_reqwest_error, NetworkError};
pub use stream::StreamError;

/// Result alias for client operations.
pub type PlatewiseResult<T> = std::result::Result<T, PlatewiseError>;

/// Unified error type for all client operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatewiseError {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlatewiseError {
    /// Whether a fresh attempt at the same operation could plausibly
    /// succeed. The client never retries on its own; this drives the
    /// caller's retry affordance.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatewiseError::Network(e) => e.is_retryable(),
            PlatewiseError::Stream(e) => e.is_retryable(),
            PlatewiseError::Http(e) => e.is_timeout() || e.is_connect(),
            PlatewiseError::Json(_) => false,
        }
    }

    /// True for a 404-shaped failure (unknown scan id / barcode).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlatewiseError::Network(NetworkError::NotFound { .. })
        )
    }
}
