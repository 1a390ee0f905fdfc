//! Domain models for scans, products, and analysis results.
//!
//! These types mirror the wire shapes the Platewise backend sends in scan
//! snapshots and poll responses. Deserialization is tolerant of the field
//! aliases and nullable values different backend versions emit.

mod analysis;
mod product;
mod request;
mod scan;

pub use analysis::{AnalysisResult, CachedAnalysis, IngredientRecommendation, SafetyRating};
pub use product::{MatchStatus, ProductInfo};
pub use request::{AnalyzeRequest, ChatRequest, ScanStreamRequest};
pub use scan::{LifecycleState, Scan, ScanImage, ScanType};

use serde::{Deserialize, Deserializer};

/// Deserialize an error field that may arrive as a bare string, as an
/// object with a `message` field, or as null.
pub(crate) fn deserialize_error_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Text(String),
        Shaped { message: String },
        Other(serde_json::Value),
    }

    Ok(match Option::<ErrorField>::deserialize(deserializer)? {
        Some(ErrorField::Text(s)) if !s.is_empty() => Some(s),
        Some(ErrorField::Shaped { message }) => Some(message),
        Some(ErrorField::Other(v)) if !v.is_null() => Some(v.to_string()),
        _ => None,
    })
}
