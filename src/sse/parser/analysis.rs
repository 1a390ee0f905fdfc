//! Parsing for the unified-analysis protocol.

use crate::models::{IngredientRecommendation, ProductInfo, Scan};
use crate::sse::events::{AnalysisEvent, SseParseError, StreamFailure};
use crate::sse::payloads::ErrorPayload;

use super::decode_payload;

/// Decode one raw event on the unified-analysis catalogue.
///
/// `scan` carries a partial snapshot; `product` and `analysis` are the
/// legacy narrow shapes; `error` is the server-declared failure. Unknown
/// event types (keep-alives, future additions) are ignored.
pub fn parse_analysis_event(
    event_type: &str,
    data: &str,
) -> Result<Option<AnalysisEvent>, SseParseError> {
    match event_type {
        "scan" => {
            let snapshot: Scan = decode_payload(event_type, data)?;
            Ok(Some(AnalysisEvent::Scan(snapshot)))
        }
        "product" => {
            let product: ProductInfo = decode_payload(event_type, data)?;
            Ok(Some(AnalysisEvent::Product(product)))
        }
        "analysis" => {
            let recommendations: Vec<IngredientRecommendation> =
                decode_payload(event_type, data)?;
            Ok(Some(AnalysisEvent::Analysis(recommendations)))
        }
        "error" => {
            let payload: ErrorPayload = decode_payload(event_type, data)?;
            Ok(Some(AnalysisEvent::Error(StreamFailure {
                message: payload.message,
                status: payload.status,
                details: payload.details,
            })))
        }
        _ => Ok(None),
    }
}
