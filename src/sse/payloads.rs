//! Payload deserialization structs for event data.
//!
//! Internal serde shapes tolerant of the field names different backend
//! versions use. The typed events in `events` are built from these.

use serde::Deserialize;

/// Error event payload. Older backends send `statusCode`, newer ones
/// `status`; the message may arrive under `error`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(alias = "error")]
    pub message: String,
    #[serde(default, alias = "statusCode")]
    pub status: Option<u16>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Chat turn payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatTurnPayload {
    pub conversation_id: String,
    pub turn_id: String,
    pub state: crate::sse::TurnState,
    #[serde(default)]
    pub response: Option<String>,
}

/// Chat error payload. The message may arrive under `message` instead of
/// `error`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatErrorPayload {
    #[serde(alias = "message")]
    pub error: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub turn_id: Option<String>,
}
