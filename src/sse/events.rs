//! Typed event definitions for the three streaming protocols.
//!
//! Each protocol gets its own tagged union so dispatch is checked for
//! exhaustiveness per protocol kind, instead of routing on bare strings.

use serde::{Deserialize, Serialize};

use crate::models::{IngredientRecommendation, ProductInfo, Scan};

/// Which event catalogue governs a session's event types and payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Barcode lookup with combined product + analysis delivery
    UnifiedAnalysis,
    /// Scan snapshot push
    BarcodeScan,
    /// Conversational exchange
    Chat,
}

impl Protocol {
    /// Name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::UnifiedAnalysis => "unified_analysis",
            Protocol::BarcodeScan => "barcode_scan",
            Protocol::Chat => "chat",
        }
    }
}

/// One event record after framing and envelope unwrapping, before typed
/// payload decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub event_type: String,
    pub data: String,
}

/// Server-declared failure carried by an `error` event.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFailure {
    pub message: String,
    pub status: Option<u16>,
    pub details: Option<serde_json::Value>,
}

impl StreamFailure {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: None,
        }
    }
}

/// Events on the unified-analysis protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    /// Partial scan snapshot with its own lifecycle state
    Scan(Scan),
    /// Legacy: full product object
    Product(ProductInfo),
    /// Legacy: array of ingredient recommendations
    Analysis(Vec<IngredientRecommendation>),
    /// Top-level error - terminates the session
    Error(StreamFailure),
}

impl AnalysisEvent {
    pub fn event_type_name(&self) -> &'static str {
        match self {
            AnalysisEvent::Scan(_) => "scan",
            AnalysisEvent::Product(_) => "product",
            AnalysisEvent::Analysis(_) => "analysis",
            AnalysisEvent::Error(_) => "error",
        }
    }
}

/// Events on the barcode-scan protocol. The catalogue has a single event
/// type; terminal behavior comes from the snapshot's own state.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Scan(Scan),
}

impl ScanEvent {
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ScanEvent::Scan(_) => "scan",
        }
    }
}

/// Phase of a chat turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Thinking,
    Done,
}

/// One conversational turn update.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub conversation_id: String,
    pub turn_id: String,
    pub state: TurnState,
    pub response: Option<String>,
}

/// Failure on the chat protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatFailure {
    pub error: String,
    pub conversation_id: Option<String>,
    pub turn_id: Option<String>,
}

/// Events on the chat protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Turn(ChatTurn),
    Error(ChatFailure),
}

impl ChatEvent {
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ChatEvent::Turn(_) => "turn",
            ChatEvent::Error(_) => "error",
        }
    }
}

/// Errors that can occur while decoding an event record.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Invalid JSON in data payload (after the one-shot string fallback)
    InvalidJson { event_type: String, source: String },
    /// Event type requires a payload but none arrived
    MissingData { event_type: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::MissingData { event_type } => {
                write!(f, "missing data for event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
