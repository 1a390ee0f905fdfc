//! Legacy barcode-analysis result store.
//!
//! The older analysis path accumulates a result incrementally: product
//! first, recommendations later, with error/not-found flags settable from
//! either side. One entry per barcode; a re-analysis overwrites the entry
//! rather than appending.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use crate::models::{CachedAnalysis, IngredientRecommendation, MatchStatus, ProductInfo};

/// In-memory store of the legacy per-barcode analysis results.
#[derive(Debug, Default)]
pub struct AnalysisStore {
    inner: Mutex<HashMap<String, CachedAnalysis>>,
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) an analysis for `barcode`: installs a fresh entry
    /// and returns its correlation id. Any previous result for the barcode
    /// is overwritten.
    pub fn begin(&self, barcode: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        let entry = CachedAnalysis::new(barcode, correlation_id.clone());
        self.inner
            .lock()
            .expect("analysis store poisoned")
            .insert(barcode.to_string(), entry);
        correlation_id
    }

    pub fn get(&self, barcode: &str) -> Option<CachedAnalysis> {
        self.inner
            .lock()
            .expect("analysis store poisoned")
            .get(barcode)
            .cloned()
    }

    /// Record the resolved product for an in-flight analysis, deriving the
    /// match/not-found flags from its match status.
    pub fn record_product(&self, barcode: &str, product: ProductInfo) {
        let mut inner = self.inner.lock().expect("analysis store poisoned");
        if let Some(entry) = inner.get_mut(barcode) {
            entry.match_status = product.match_status;
            entry.not_found = product.match_status == Some(MatchStatus::NotFound);
            entry.product = Some(product);
        } else {
            debug!(barcode, "product update for unknown analysis dropped");
        }
    }

    /// Record the recommendation list. Each analysis produces a fresh list;
    /// this replaces, never appends.
    pub fn record_recommendations(
        &self,
        barcode: &str,
        recommendations: Vec<IngredientRecommendation>,
    ) {
        let mut inner = self.inner.lock().expect("analysis store poisoned");
        if let Some(entry) = inner.get_mut(barcode) {
            entry.ingredient_recommendations = recommendations;
        } else {
            debug!(barcode, "recommendations for unknown analysis dropped");
        }
    }

    /// Record a terminal failure. The first error wins; later updates from
    /// other callback sites cannot overwrite it, which keeps out-of-order
    /// delivery deterministic.
    pub fn record_error(&self, barcode: &str, message: &str) {
        let mut inner = self.inner.lock().expect("analysis store poisoned");
        if let Some(entry) = inner.get_mut(barcode) {
            if entry.error_message.is_none() {
                entry.error_message = Some(message.to_string());
            }
        }
    }

    /// Drop the entry for `barcode` (explicit user retry).
    pub fn clear(&self, barcode: &str) {
        self.inner
            .lock()
            .expect("analysis store poisoned")
            .remove(barcode);
    }
}
