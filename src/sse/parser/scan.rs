//! Parsing for the barcode-scan protocol.

use crate::models::Scan;
use crate::sse::events::{ScanEvent, SseParseError};

use super::decode_payload;

/// Decode one raw event on the barcode-scan catalogue.
///
/// The catalogue carries a single event type: a full scan snapshot.
/// Terminal behavior (`done`, `error`) comes from the snapshot's state,
/// not from distinct event types. Anything else is ignored.
pub fn parse_scan_event(
    event_type: &str,
    data: &str,
) -> Result<Option<ScanEvent>, SseParseError> {
    match event_type {
        "scan" => {
            let snapshot: Scan = decode_payload(event_type, data)?;
            Ok(Some(ScanEvent::Scan(snapshot)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifecycleState;

    #[test]
    fn test_parse_full_snapshot() {
        let data = r#"{
            "id": "scan-9",
            "state": "done",
            "scan_type": "barcode",
            "product_info": {"name": "Yogurt"},
            "analysis_result": {"recommendations": []},
            "images": [{"id": "img-1", "url": "https://cdn/img-1.jpg"}]
        }"#;
        let event = parse_scan_event("scan", data).unwrap().unwrap();
        let ScanEvent::Scan(scan) = event;
        assert_eq!(scan.id, "scan-9");
        assert_eq!(scan.lifecycle_state, LifecycleState::Done);
        assert_eq!(scan.images.len(), 1);
        assert!(scan.analysis_result.is_some());
    }

    #[test]
    fn test_unknown_event_ignored() {
        assert!(parse_scan_event("ping", "{}").unwrap().is_none());
        assert!(parse_scan_event("product", r#"{"name":"x"}"#).unwrap().is_none());
    }

    #[test]
    fn test_malformed_snapshot_is_error() {
        let result = parse_scan_event("scan", r#"{"state": "done"}"#);
        // missing required id field
        assert!(matches!(result, Err(SseParseError::InvalidJson { .. })));
    }
}
