use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_error_field, AnalysisResult, ProductInfo};

/// How a scan was initiated - determines which delivery path (push stream
/// vs polling) carries its updates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    /// Barcode lookup (push delivery via SSE)
    Barcode,
    /// Photo-based identification (no push delivery, polled)
    Photo,
    /// Barcode lookup enriched with photos
    #[serde(alias = "barcode_photo")]
    BarcodePlusPhoto,
}

impl ScanType {
    /// Whether the backend pushes progress for this scan kind over SSE.
    /// Photo scans have no push delivery and rely on the polling fallback.
    pub fn has_push_delivery(&self) -> bool {
        !matches!(self, ScanType::Photo)
    }
}

/// Phase of a scan's lifecycle as reported by the backend.
///
/// The non-error phases form a chain
/// `FetchingProductInfo < ProcessingImages < Analyzing < Done`; `Error` is
/// reachable from any non-terminal phase. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    FetchingProductInfo,
    ProcessingImages,
    Analyzing,
    Done,
    #[serde(alias = "failed")]
    Error,
}

impl LifecycleState {
    /// Terminal states end the stream/poll loop and are never superseded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Done | LifecycleState::Error)
    }

    /// Position on the ordered non-error chain. `Error` sits off the chain
    /// and is compared separately.
    fn chain_rank(&self) -> u8 {
        match self {
            LifecycleState::FetchingProductInfo => 0,
            LifecycleState::ProcessingImages => 1,
            LifecycleState::Analyzing => 2,
            LifecycleState::Done => 3,
            LifecycleState::Error => 0,
        }
    }

    /// True if a candidate update carrying `self` is strictly greater than
    /// `current` under the lifecycle partial order. A terminal `current` is
    /// never superseded.
    pub fn supersedes(&self, current: LifecycleState) -> bool {
        if current.is_terminal() {
            return false;
        }
        match self {
            LifecycleState::Error => true,
            _ => self.chain_rank() > current.chain_rank(),
        }
    }
}

/// An image attached to a scan (photo-scan uploads, product shots).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScanImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A scan snapshot - the externally visible unit of work.
///
/// The same shape arrives from `scan` stream events and from the
/// GET-by-id poll endpoint. All mutation goes through the cache reconciler;
/// producers never write a `Scan` into shared state directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scan {
    pub id: String,
    /// Backend sends the lifecycle phase as `state`.
    #[serde(rename = "state")]
    pub lifecycle_state: LifecycleState,
    #[serde(default)]
    pub scan_type: Option<ScanType>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub product_info: Option<ProductInfo>,
    #[serde(default)]
    pub analysis_result: Option<AnalysisResult>,
    #[serde(default)]
    pub images: Vec<ScanImage>,
    /// Accepts `error` as a string, an object with `message`, or null.
    #[serde(
        default,
        alias = "error",
        deserialize_with = "deserialize_error_field"
    )]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub favorited: bool,
}

impl Scan {
    /// Minimal snapshot with just an id and a state, used when synthesizing
    /// candidates (e.g. merging a poll-fetch failure as an error state).
    pub fn stub(id: &str, state: LifecycleState) -> Self {
        Self {
            id: id.to_string(),
            lifecycle_state: state,
            scan_type: None,
            barcode: None,
            product_info: None,
            analysis_result: None,
            images: Vec::new(),
            error_message: None,
            created_at: None,
            last_activity_at: None,
            favorited: false,
        }
    }

    /// Error-state candidate for a failed fetch or stream.
    pub fn failed(id: &str, message: impl Into<String>) -> Self {
        let mut scan = Self::stub(id, LifecycleState::Error);
        scan.error_message = Some(message.into());
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_chain_order() {
        use LifecycleState::*;
        assert!(ProcessingImages.supersedes(FetchingProductInfo));
        assert!(Analyzing.supersedes(ProcessingImages));
        assert!(Done.supersedes(Analyzing));
        assert!(Done.supersedes(FetchingProductInfo));
        assert!(!FetchingProductInfo.supersedes(Analyzing));
        assert!(!Analyzing.supersedes(Analyzing));
    }

    #[test]
    fn test_terminal_states_never_superseded() {
        use LifecycleState::*;
        assert!(!Analyzing.supersedes(Done));
        assert!(!Error.supersedes(Done));
        assert!(!Done.supersedes(Error));
        assert!(!Error.supersedes(Error));
    }

    #[test]
    fn test_error_supersedes_non_terminal() {
        use LifecycleState::*;
        assert!(Error.supersedes(FetchingProductInfo));
        assert!(Error.supersedes(ProcessingImages));
        assert!(Error.supersedes(Analyzing));
    }

    #[test]
    fn test_scan_snapshot_deserialization() {
        let json = r#"{
            "id": "scan-1",
            "state": "analyzing",
            "barcode": "0123456789012",
            "product_info": {"name": "Soda"},
            "favorited": true
        }"#;
        let scan: Scan = serde_json::from_str(json).unwrap();
        assert_eq!(scan.id, "scan-1");
        assert_eq!(scan.lifecycle_state, LifecycleState::Analyzing);
        assert_eq!(scan.barcode.as_deref(), Some("0123456789012"));
        assert_eq!(scan.product_info.unwrap().name, "Soda");
        assert!(scan.favorited);
        assert!(scan.analysis_result.is_none());
        assert!(scan.images.is_empty());
    }

    #[test]
    fn test_scan_error_string_alias() {
        let json = r#"{"id": "s1", "state": "error", "error": "lookup failed"}"#;
        let scan: Scan = serde_json::from_str(json).unwrap();
        assert_eq!(scan.lifecycle_state, LifecycleState::Error);
        assert_eq!(scan.error_message.as_deref(), Some("lookup failed"));
    }

    #[test]
    fn test_scan_failed_state_alias() {
        let json = r#"{"id": "s1", "state": "failed"}"#;
        let scan: Scan = serde_json::from_str(json).unwrap();
        assert_eq!(scan.lifecycle_state, LifecycleState::Error);
    }

    #[test]
    fn test_photo_scans_have_no_push_delivery() {
        assert!(!ScanType::Photo.has_push_delivery());
        assert!(ScanType::Barcode.has_push_delivery());
        assert!(ScanType::BarcodePlusPhoto.has_push_delivery());
    }

    #[test]
    fn test_failed_constructor() {
        let scan = Scan::failed("s9", "fetch timed out");
        assert_eq!(scan.lifecycle_state, LifecycleState::Error);
        assert_eq!(scan.error_message.as_deref(), Some("fetch timed out"));
    }
}
