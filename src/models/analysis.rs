use serde::{Deserialize, Serialize};

use super::{MatchStatus, ProductInfo};

/// Safety verdict for a single ingredient against the household's
/// dietary profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SafetyRating {
    Safe,
    MaybeUnsafe,
    DefinitelyUnsafe,
}

/// Per-ingredient recommendation. Derived data - each analysis produces a
/// fresh list, entries are never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientRecommendation {
    #[serde(alias = "ingredient")]
    pub ingredient_name: String,
    pub safety: SafetyRating,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub preference_explanation: Option<String>,
    #[serde(default)]
    pub affected_member_ids: Vec<String>,
}

/// Full analysis outcome attached to a scan snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisResult {
    #[serde(default, alias = "ingredient_recommendations")]
    pub recommendations: Vec<IngredientRecommendation>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub overall_safety: Option<SafetyRating>,
}

/// Cached result for the legacy barcode-analysis path.
///
/// One entry per barcode, created when an analysis starts and updated in
/// place as partial events (product, then recommendations) arrive. A
/// re-analysis overwrites the entry rather than appending.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAnalysis {
    pub barcode: String,
    pub product: Option<ProductInfo>,
    pub ingredient_recommendations: Vec<IngredientRecommendation>,
    pub match_status: Option<MatchStatus>,
    pub not_found: bool,
    pub error_message: Option<String>,
    pub correlation_id: String,
}

impl CachedAnalysis {
    pub fn new(barcode: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            product: None,
            ingredient_recommendations: Vec::new(),
            match_status: None,
            not_found: false,
            error_message: None,
            correlation_id: correlation_id.into(),
        }
    }

    /// Whether the analysis has reached an outcome the UI can settle on.
    pub fn is_settled(&self) -> bool {
        self.error_message.is_some()
            || self.not_found
            || !self.ingredient_recommendations.is_empty()
    }
}
