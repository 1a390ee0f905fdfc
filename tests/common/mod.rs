//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use platewise::models::{
    AnalysisResult, IngredientRecommendation, ProductInfo, ScanImage, ScanType,
};
use platewise::sse::{ChatFailure, ChatTurn, StreamFailure};
use platewise::traits::{AnalysisHandler, ChatHandler, ScanHandler};

/// Install a test subscriber once so RUST_LOG=debug shows client traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Build an SSE record with explicit event type and data payload.
pub fn sse_record(event_type: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event_type, data)
}

/// Handler double that records every invocation.
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn log(&self, entry: impl Into<String>) {
        self.calls.lock().unwrap().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn error_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with("error"))
            .count()
    }

    /// Coerce a shared recorder into an analysis-handler trait object.
    pub fn as_analysis(self: &Arc<Self>) -> Arc<dyn AnalysisHandler> {
        self.clone()
    }

    /// Coerce a shared recorder into a chat-handler trait object.
    pub fn as_chat(self: &Arc<Self>) -> Arc<dyn ChatHandler> {
        self.clone()
    }
}

impl AnalysisHandler for RecordingHandler {
    fn on_product(&self, product: ProductInfo) {
        self.log(format!("product:{}", product.name));
    }

    fn on_analysis(&self, recommendations: Vec<IngredientRecommendation>) {
        self.log(format!("analysis:{}", recommendations.len()));
    }

    fn on_error(&self, failure: StreamFailure) {
        self.log(format!("error:{}", failure.message));
    }
}

impl ScanHandler for RecordingHandler {
    fn on_product_info(
        &self,
        product: ProductInfo,
        scan_id: &str,
        _source: Option<ScanType>,
        _images: &[ScanImage],
    ) {
        self.log(format!("product:{}:{}", product.name, scan_id));
    }

    fn on_analysis_result(&self, result: AnalysisResult) {
        self.log(format!("result:{}", result.recommendations.len()));
    }

    fn on_error(&self, failure: StreamFailure, scan_id: &str) {
        self.log(format!("error:{}:{}", failure.message, scan_id));
    }
}

impl ChatHandler for RecordingHandler {
    fn on_thinking(&self, turn: ChatTurn) {
        self.log(format!("thinking:{}", turn.turn_id));
    }

    fn on_response(&self, turn: ChatTurn) {
        self.log(format!("response:{}", turn.response.unwrap_or_default()));
    }

    fn on_error(&self, failure: ChatFailure) {
        self.log(format!("error:{}", failure.error));
    }
}
