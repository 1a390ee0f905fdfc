//! Network-related error types.

use std::fmt;

/// Failures around issuing a request or reading its response.
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed { url: String, message: String },

    /// Request timed out.
    Timeout {
        operation: String,
        duration_secs: u64,
    },

    /// HTTP status error (non-2xx response before streaming began).
    HttpStatus { status: u16, message: String },

    /// The requested scan or product does not exist (404).
    NotFound { resource: String },

    /// Response body could not be interpreted.
    InvalidResponse { message: String },

    /// Request was cancelled by the caller.
    Cancelled,

    /// Generic network error.
    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::NotFound { .. } => false,
            NetworkError::InvalidResponse { .. } => false,
            NetworkError::Cancelled => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// True when the status demands a fresh credential rather than a retry.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, NetworkError::HttpStatus { status: 401, .. })
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "connection to {} failed: {}", url, message)
            }
            NetworkError::Timeout {
                operation,
                duration_secs,
            } => write!(f, "{} timed out after {}s", operation, duration_secs),
            NetworkError::HttpStatus { status, message } => {
                write!(f, "server returned {}: {}", status, message)
            }
            NetworkError::NotFound { resource } => write!(f, "{} not found", resource),
            NetworkError::InvalidResponse { message } => {
                write!(f, "invalid response: {}", message)
            }
            NetworkError::Cancelled => write!(f, "request cancelled"),
            NetworkError::Other { message } => write!(f, "network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Classify a reqwest error into the network taxonomy.
pub fn classify_reqwest_error(err: &reqwest::Error, operation: &str) -> NetworkError {
    if err.is_timeout() {
        return NetworkError::Timeout {
            operation: operation.to_string(),
            duration_secs: 0,
        };
    }
    if err.is_connect() {
        return NetworkError::ConnectionFailed {
            url: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            message: err.to_string(),
        };
    }
    if let Some(status) = err.status() {
        return NetworkError::HttpStatus {
            status: status.as_u16(),
            message: err.to_string(),
        };
    }
    NetworkError::Other {
        message: err.to_string(),
    }
}
