//! Caller-supplied handlers invoked by the protocol dispatchers.
//!
//! Handlers are the seam between the read loop and the UI layer: the
//! session task invokes them in event-arrival order, and the consumer is
//! expected to marshal any UI mutation onto its own single execution
//! context. Methods take `&self`; implementations share state behind their
//! own synchronization (`Arc<Mutex<...>>` in tests).

use crate::models::{AnalysisResult, IngredientRecommendation, ProductInfo, ScanImage, ScanType};
use crate::sse::{ChatFailure, ChatTurn, StreamFailure};

/// Handlers for the unified-analysis protocol (barcode lookup).
pub trait AnalysisHandler: Send + Sync {
    /// Product identity resolved (or final match status on `done`).
    fn on_product(&self, product: ProductInfo);

    /// Ingredient recommendations arrived.
    fn on_analysis(&self, recommendations: Vec<IngredientRecommendation>);

    /// Terminal failure for this session. Invoked at most once.
    fn on_error(&self, failure: StreamFailure);
}

/// Handlers for the barcode-scan protocol (scan snapshot push).
pub trait ScanHandler: Send + Sync {
    /// Product identity became available for the scan.
    fn on_product_info(
        &self,
        product: ProductInfo,
        scan_id: &str,
        source: Option<ScanType>,
        images: &[ScanImage],
    );

    /// Final analysis result for the scan.
    fn on_analysis_result(&self, result: AnalysisResult);

    /// Terminal failure for the scan. Invoked at most once.
    fn on_error(&self, failure: StreamFailure, scan_id: &str);
}

/// Handlers for the chat protocol.
pub trait ChatHandler: Send + Sync {
    /// The assistant is working on a turn.
    fn on_thinking(&self, turn: ChatTurn);

    /// A turn completed with a response.
    fn on_response(&self, turn: ChatTurn);

    /// Terminal failure for the chat session. Invoked at most once.
    fn on_error(&self, failure: ChatFailure);
}
