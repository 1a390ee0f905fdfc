//! Session read loops.
//!
//! One session is one open read loop over a typed event stream. The loop
//! runs strictly in arrival order with no internal concurrency: mirror the
//! event into the caches, dispatch it to the handlers, stop on the first
//! `Terminate`. Once terminated, remaining bytes on the connection are
//! never processed (the stream is dropped).
//!
//! Failure policy (one place, applied uniformly):
//! - decode failures were already dropped upstream and never reach here
//! - a transport error surfaces through the protocol's error handler at
//!   most once, then the session ends
//! - a clean end-of-stream without a terminal event is a normal exit (the
//!   older analysis protocol leaves the connection open after its last
//!   event and relies on the server closing it)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::cache::{AnalysisStore, ScanCache};
use crate::error::PlatewiseError;
use crate::models::Scan;
use crate::sse::{AnalysisEvent, ChatEvent, ChatFailure, ScanEvent, StreamFailure};
use crate::traits::{AnalysisHandler, ChatHandler, ScanHandler};

use super::dispatcher::{dispatch_analysis, dispatch_chat, dispatch_scan, Flow};

/// Cooperative cancellation flag checked at each record boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a session's read loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Terminal success, or the server closed a legacy stream cleanly
    Completed,
    /// Error event or transport failure (error handler was invoked once)
    Failed,
    /// Cancelled by the caller
    Cancelled,
}

fn transport_failure(err: &PlatewiseError) -> StreamFailure {
    StreamFailure::from_message(err.to_string())
}

/// Id for a synthesized error candidate: the cached scan's real id when one
/// was observed, otherwise the cache key itself.
fn scan_id_for(cache: &ScanCache, key: &str) -> String {
    cache.get(key).map(|scan| scan.id).unwrap_or_else(|| key.to_string())
}

/// Drive a unified-analysis session keyed by `barcode`.
///
/// Scan snapshots merge into the scan cache under the barcode key; legacy
/// product/analysis events update the in-place analysis store entry.
pub async fn run_analysis_session<S>(
    mut events: S,
    barcode: &str,
    cache: &ScanCache,
    store: &AnalysisStore,
    handler: &dyn AnalysisHandler,
    cancel: &CancelFlag,
) -> SessionOutcome
where
    S: Stream<Item = Result<AnalysisEvent, PlatewiseError>> + Unpin,
{
    let mut error_surfaced = false;

    while let Some(item) = events.next().await {
        if cancel.is_cancelled() {
            debug!(barcode, "analysis session cancelled");
            return SessionOutcome::Cancelled;
        }

        match item {
            Ok(event) => {
                match &event {
                    AnalysisEvent::Scan(scan) => {
                        cache.merge(barcode, scan.clone());
                        if scan.lifecycle_state == crate::models::LifecycleState::Error {
                            if error_surfaced {
                                return SessionOutcome::Failed;
                            }
                            error_surfaced = true;
                            store.record_error(
                                barcode,
                                scan.error_message.as_deref().unwrap_or("scan failed"),
                            );
                        }
                    }
                    AnalysisEvent::Product(product) => {
                        store.record_product(barcode, product.clone());
                    }
                    AnalysisEvent::Analysis(recommendations) => {
                        store.record_recommendations(barcode, recommendations.clone());
                    }
                    AnalysisEvent::Error(failure) => {
                        if error_surfaced {
                            return SessionOutcome::Failed;
                        }
                        error_surfaced = true;
                        store.record_error(barcode, &failure.message);
                        let id = scan_id_for(cache, barcode);
                        cache.merge(barcode, Scan::failed(&id, failure.message.clone()));
                    }
                }

                match dispatch_analysis(event, handler) {
                    Flow::Continue => {}
                    Flow::Terminate => {
                        return if error_surfaced {
                            SessionOutcome::Failed
                        } else {
                            SessionOutcome::Completed
                        };
                    }
                }
            }
            Err(err) => {
                warn!(barcode, error = %err, "analysis stream transport failure");
                if !error_surfaced {
                    store.record_error(barcode, &err.to_string());
                    let id = scan_id_for(cache, barcode);
                    cache.merge(barcode, Scan::failed(&id, err.to_string()));
                    handler.on_error(transport_failure(&err));
                }
                return SessionOutcome::Failed;
            }
        }
    }

    debug!(barcode, "analysis stream closed by server");
    SessionOutcome::Completed
}

/// Drive a barcode-scan session keyed by `scan_id`.
pub async fn run_scan_session<S>(
    mut events: S,
    scan_id: &str,
    cache: &ScanCache,
    handler: &dyn ScanHandler,
    cancel: &CancelFlag,
) -> SessionOutcome
where
    S: Stream<Item = Result<ScanEvent, PlatewiseError>> + Unpin,
{
    let mut error_surfaced = false;

    while let Some(item) = events.next().await {
        if cancel.is_cancelled() {
            debug!(scan_id, "scan session cancelled");
            return SessionOutcome::Cancelled;
        }

        match item {
            Ok(event) => {
                let ScanEvent::Scan(ref scan) = event;
                cache.merge(scan_id, scan.clone());
                if scan.lifecycle_state == crate::models::LifecycleState::Error {
                    if error_surfaced {
                        return SessionOutcome::Failed;
                    }
                    error_surfaced = true;
                }

                match dispatch_scan(event, handler) {
                    Flow::Continue => {}
                    Flow::Terminate => {
                        return if error_surfaced {
                            SessionOutcome::Failed
                        } else {
                            SessionOutcome::Completed
                        };
                    }
                }
            }
            Err(err) => {
                warn!(scan_id, error = %err, "scan stream transport failure");
                if !error_surfaced {
                    cache.merge(scan_id, Scan::failed(scan_id, err.to_string()));
                    handler.on_error(transport_failure(&err), scan_id);
                }
                return SessionOutcome::Failed;
            }
        }
    }

    debug!(scan_id, "scan stream closed by server");
    SessionOutcome::Completed
}

/// Drive a chat session. Chat has no cache interaction; turns flow to the
/// handlers until the server errors, the caller cancels, or the
/// connection closes.
pub async fn run_chat_session<S>(
    mut events: S,
    handler: &dyn ChatHandler,
    cancel: &CancelFlag,
) -> SessionOutcome
where
    S: Stream<Item = Result<ChatEvent, PlatewiseError>> + Unpin,
{
    let mut error_surfaced = false;

    while let Some(item) = events.next().await {
        if cancel.is_cancelled() {
            debug!("chat session cancelled");
            return SessionOutcome::Cancelled;
        }

        match item {
            Ok(event) => {
                if matches!(event, ChatEvent::Error(_)) {
                    if error_surfaced {
                        return SessionOutcome::Failed;
                    }
                    error_surfaced = true;
                }
                match dispatch_chat(event, handler) {
                    Flow::Continue => {}
                    Flow::Terminate => {
                        return if error_surfaced {
                            SessionOutcome::Failed
                        } else {
                            SessionOutcome::Completed
                        };
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "chat stream transport failure");
                if !error_surfaced {
                    handler.on_error(ChatFailure {
                        error: err.to_string(),
                        conversation_id: None,
                        turn_id: None,
                    });
                }
                return SessionOutcome::Failed;
            }
        }
    }

    SessionOutcome::Completed
}
