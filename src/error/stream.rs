//! Streaming-related error types.

use std::fmt;

use crate::sse::SseParseError;

/// Failures inside an open event stream.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// Stream connection was lost unexpectedly.
    ConnectionLost { message: String },

    /// Failed to parse an event record.
    Parse(SseParseError),

    /// Backend reported an error via an explicit `error` event.
    BackendError {
        message: String,
        status: Option<u16>,
    },

    /// Stream was closed by the server before a terminal event.
    ServerClosed { reason: Option<String> },
}

impl StreamError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionLost { .. } | StreamError::ServerClosed { .. }
        )
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionLost { message } => {
                write!(f, "stream connection lost: {}", message)
            }
            StreamError::Parse(e) => write!(f, "event parse failure: {}", e),
            StreamError::BackendError { message, status } => match status {
                Some(code) => write!(f, "backend error ({}): {}", code, message),
                None => write!(f, "backend error: {}", message),
            },
            StreamError::ServerClosed { reason } => match reason {
                Some(r) => write!(f, "server closed the stream: {}", r),
                None => write!(f, "server closed the stream"),
            },
        }
    }
}

impl std::error::Error for StreamError {}

impl From<SseParseError> for StreamError {
    fn from(err: SseParseError) -> Self {
        StreamError::Parse(err)
    }
}
