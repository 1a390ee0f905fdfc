//! Per-protocol event dispatch.
//!
//! Given one decoded event, invoke the right caller handler and decide
//! whether the stream session should keep reading. The dispatcher holds no
//! state; the at-most-once error guarantee lives in the session loop that
//! stops reading after the first `Terminate`.

use crate::models::LifecycleState;
use crate::sse::{AnalysisEvent, ChatEvent, ScanEvent, StreamFailure, TurnState};
use crate::traits::{AnalysisHandler, ChatHandler, ScanHandler};

/// Whether the session keeps reading after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Route one unified-analysis event.
///
/// `scan` snapshots route on their own state: the early states are
/// informational, `analyzing` surfaces the product when present, `done`
/// surfaces product (final match status) then recommendations and ends the
/// session, `error` surfaces the failure and ends the session. The legacy
/// `product`/`analysis` events map 1:1 to handlers; legacy `analysis` keeps
/// the connection open (the older protocol did not close after it).
pub fn dispatch_analysis(event: AnalysisEvent, handler: &dyn AnalysisHandler) -> Flow {
    match event {
        AnalysisEvent::Scan(scan) => match scan.lifecycle_state {
            LifecycleState::FetchingProductInfo | LifecycleState::ProcessingImages => {
                Flow::Continue
            }
            LifecycleState::Analyzing => {
                if let Some(product) = scan.product_info {
                    handler.on_product(product);
                }
                Flow::Continue
            }
            LifecycleState::Done => {
                if let Some(product) = scan.product_info {
                    handler.on_product(product);
                }
                let recommendations = scan
                    .analysis_result
                    .map(|result| result.recommendations)
                    .unwrap_or_default();
                handler.on_analysis(recommendations);
                Flow::Terminate
            }
            LifecycleState::Error => {
                let message = scan
                    .error_message
                    .unwrap_or_else(|| "scan failed".to_string());
                handler.on_error(StreamFailure::from_message(message));
                Flow::Terminate
            }
        },
        AnalysisEvent::Product(product) => {
            handler.on_product(product);
            Flow::Continue
        }
        AnalysisEvent::Analysis(recommendations) => {
            handler.on_analysis(recommendations);
            Flow::Continue
        }
        AnalysisEvent::Error(failure) => {
            handler.on_error(failure);
            Flow::Terminate
        }
    }
}

/// Route one barcode-scan event. Snapshots route on their state; `done`
/// and `error` terminate.
pub fn dispatch_scan(event: ScanEvent, handler: &dyn ScanHandler) -> Flow {
    let ScanEvent::Scan(scan) = event;
    match scan.lifecycle_state {
        LifecycleState::FetchingProductInfo | LifecycleState::ProcessingImages => Flow::Continue,
        LifecycleState::Analyzing => {
            if let Some(product) = scan.product_info {
                handler.on_product_info(product, &scan.id, scan.scan_type, &scan.images);
            }
            Flow::Continue
        }
        LifecycleState::Done => {
            if let Some(product) = scan.product_info {
                handler.on_product_info(product, &scan.id, scan.scan_type, &scan.images);
            }
            if let Some(result) = scan.analysis_result {
                handler.on_analysis_result(result);
            }
            Flow::Terminate
        }
        LifecycleState::Error => {
            let message = scan
                .error_message
                .clone()
                .unwrap_or_else(|| "scan failed".to_string());
            handler.on_error(StreamFailure::from_message(message), &scan.id);
            Flow::Terminate
        }
    }
}

/// Route one chat event. Turns never terminate the session on their own;
/// a chat session stays open across turns. An explicit error terminates.
pub fn dispatch_chat(event: ChatEvent, handler: &dyn ChatHandler) -> Flow {
    match event {
        ChatEvent::Turn(turn) => {
            match turn.state {
                TurnState::Thinking => handler.on_thinking(turn),
                TurnState::Done => handler.on_response(turn),
            }
            Flow::Continue
        }
        ChatEvent::Error(failure) => {
            handler.on_error(failure);
            Flow::Terminate
        }
    }
}
