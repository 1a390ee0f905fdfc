//! Request bodies for the streaming and polling endpoints.

use serde::Serialize;
use uuid::Uuid;

use super::ScanType;

/// Body for POST /v1/analysis/stream (unified barcode analysis).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyzeRequest {
    pub barcode: String,
    /// Client-generated id used to correlate stream events with the request.
    pub correlation_id: String,
}

impl AnalyzeRequest {
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Body for POST /v1/scans/stream (scan snapshot push).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScanStreamRequest {
    pub scan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_type: Option<ScanType>,
}

impl ScanStreamRequest {
    pub fn new(scan_id: impl Into<String>) -> Self {
        Self {
            scan_id: scan_id.into(),
            scan_type: None,
        }
    }

    pub fn with_scan_type(mut self, scan_type: ScanType) -> Self {
        self.scan_type = Some(scan_type);
        self
    }
}

/// Body for POST /v1/chat/stream (conversational exchange).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}
