//! Event record decoding.
//!
//! Two layers: [`decode_record`] resolves one framed record into a
//! `(event_type, payload)` pair, unwrapping the envelope and double-encoded
//! forms older backends emit; the per-protocol `parse_*_event` functions
//! then decode the payload against the schema the protocol expects for that
//! event type.

mod analysis;
mod chat;
mod scan;

pub use analysis::parse_analysis_event;
pub use chat::parse_chat_event;
pub use scan::parse_scan_event;

use serde::de::DeserializeOwned;

use crate::sse::events::{RawEvent, SseParseError};

/// Resolve one record's text into a raw event.
///
/// Lines prefixed `event:` set the event type; `data:` lines are
/// newline-joined in order. Records with no explicit `event:` line are
/// unwrapped from the envelope form (a JSON object carrying an `event`
/// field) or the double-encoded form (a JSON string containing a further
/// JSON document). Empty or unusable records yield `None` - a malformed
/// record must never abort the session.
pub fn decode_record(record: &str) -> Option<RawEvent> {
    let mut event_type: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in record.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event_type = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim());
        }
        // comments and unknown field lines are ignored
    }

    let data = data_lines.join("\n");
    match event_type {
        Some(et) if !et.is_empty() => Some(RawEvent {
            event_type: et,
            data,
        }),
        _ => unwrap_envelope(&data),
    }
}

/// Recover `(event_type, payload)` from an enveloped or double-encoded
/// payload.
fn unwrap_envelope(data: &str) -> Option<RawEvent> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed).ok()? {
        serde_json::Value::Object(map) => {
            let event_type = map.get("event")?.as_str()?.to_string();
            let data = match map.get("data") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            };
            Some(RawEvent { event_type, data })
        }
        // Double-encoded: the payload is a JSON string holding the real
        // document; unwrap and re-examine.
        serde_json::Value::String(inner) => unwrap_envelope(&inner),
        _ => None,
    }
}

/// Decode a payload against `T`, with the one compatibility fallback the
/// servers require: if the primary parse fails, treat the payload as a
/// JSON-encoded string containing the real document and retry once.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    event_type: &str,
    data: &str,
) -> Result<T, SseParseError> {
    if data.trim().is_empty() {
        return Err(SseParseError::MissingData {
            event_type: event_type.to_string(),
        });
    }
    match serde_json::from_str::<T>(data) {
        Ok(value) => Ok(value),
        Err(primary) => match serde_json::from_str::<String>(data) {
            Ok(inner) => serde_json::from_str::<T>(&inner).map_err(|_| {
                SseParseError::InvalidJson {
                    event_type: event_type.to_string(),
                    source: primary.to_string(),
                }
            }),
            Err(_) => Err(SseParseError::InvalidJson {
                event_type: event_type.to_string(),
                source: primary.to_string(),
            }),
        },
    }
}
