//! Orchestration over the client, caches, sessions, and poller.
//!
//! [`AnalysisService`] is the piece callers actually hold: it owns the
//! shared caches, deduplicates concurrent requests for the same key via
//! the cache's producer guard, spawns the session read loops onto worker
//! tasks, and wires the polling fallback for photo scans.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{AnalysisStore, ScanCache};
use crate::client::PlatewiseClient;
use crate::error::PlatewiseResult;
use crate::models::{AnalyzeRequest, ChatRequest, ScanStreamRequest};
use crate::poll::{PollConfig, PollController, PollHandle, UpdateCallback};
use crate::stream::{
    run_analysis_session, run_chat_session, run_scan_session, CancelFlag, SessionOutcome,
};
use crate::traits::{AnalysisHandler, ChatHandler, ScanFetcher, ScanHandler};

/// Handle to a running stream session task.
#[derive(Debug)]
pub struct SessionHandle {
    cancel: CancelFlag,
    join: JoinHandle<SessionOutcome>,
}

impl SessionHandle {
    /// Request cooperative cancellation; the read loop exits at the next
    /// record boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session to exit.
    pub async fn wait(self) -> SessionOutcome {
        self.join.await.unwrap_or(SessionOutcome::Failed)
    }
}

/// Result of asking for an analysis: either a fresh session was started,
/// or one is already live for the key and the caller should observe the
/// shared cache instead.
#[derive(Debug)]
pub enum AnalysisTicket {
    Started(SessionHandle),
    AlreadyInFlight,
}

impl AnalysisTicket {
    pub fn is_started(&self) -> bool {
        matches!(self, AnalysisTicket::Started(_))
    }
}

/// Entry point tying the client, caches, sessions, and poller together.
pub struct AnalysisService {
    client: Arc<PlatewiseClient>,
    cache: Arc<ScanCache>,
    store: Arc<AnalysisStore>,
    poll_config: PollConfig,
}

impl AnalysisService {
    pub fn new(client: PlatewiseClient) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(ScanCache::new()),
            store: Arc::new(AnalysisStore::new()),
            poll_config: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    /// Shared scan cache (UI reads go through this).
    pub fn cache(&self) -> Arc<ScanCache> {
        Arc::clone(&self.cache)
    }

    /// Shared HTTP client, e.g. for the caller's own initial fetch before
    /// handing off to the polling fallback.
    pub fn client(&self) -> Arc<PlatewiseClient> {
        Arc::clone(&self.client)
    }

    /// Shared legacy analysis store.
    pub fn store(&self) -> Arc<AnalysisStore> {
        Arc::clone(&self.store)
    }

    /// Start a barcode analysis, deduplicating concurrent requests: if a
    /// stream is already live for this barcode the call is a no-op and the
    /// caller observes the same cache entry the live session is filling.
    pub async fn analyze_barcode(
        &self,
        barcode: &str,
        handler: Arc<dyn AnalysisHandler>,
    ) -> PlatewiseResult<AnalysisTicket> {
        if !self.cache.try_claim_producer(barcode) {
            debug!(barcode, "analysis already in flight, joining existing result");
            return Ok(AnalysisTicket::AlreadyInFlight);
        }

        self.store.begin(barcode);
        let request = AnalyzeRequest::new(barcode);
        let events = match self.client.stream_analysis(&request).await {
            Ok(events) => events,
            Err(err) => {
                // Nothing was processed; release the slot so a retry can run
                self.store.record_error(barcode, &err.to_string());
                self.cache.release_producer(barcode);
                return Err(err);
            }
        };

        info!(barcode, correlation_id = %request.correlation_id, "analysis stream opened");

        let cancel = CancelFlag::new();
        let join = {
            let cache = Arc::clone(&self.cache);
            let store = Arc::clone(&self.store);
            let cancel = cancel.clone();
            let barcode = barcode.to_string();
            tokio::spawn(async move {
                let outcome = run_analysis_session(
                    events,
                    &barcode,
                    &cache,
                    &store,
                    handler.as_ref(),
                    &cancel,
                )
                .await;
                cache.release_producer(&barcode);
                outcome
            })
        };

        Ok(AnalysisTicket::Started(SessionHandle { cancel, join }))
    }

    /// Explicit user retry: clear the cached state for the barcode and
    /// start a fresh analysis. While a producer is still live this joins
    /// it instead of clearing under its feet.
    pub async fn retry_barcode(
        &self,
        barcode: &str,
        handler: Arc<dyn AnalysisHandler>,
    ) -> PlatewiseResult<AnalysisTicket> {
        if self.cache.has_live_producer(barcode) {
            return Ok(AnalysisTicket::AlreadyInFlight);
        }
        self.cache.clear(barcode);
        self.store.clear(barcode);
        self.analyze_barcode(barcode, handler).await
    }

    /// Open the scan snapshot push stream for a scan id.
    pub async fn watch_scan(
        &self,
        request: ScanStreamRequest,
        handler: Arc<dyn ScanHandler>,
    ) -> PlatewiseResult<AnalysisTicket> {
        let scan_id = request.scan_id.clone();
        if !self.cache.try_claim_producer(&scan_id) {
            debug!(scan_id, "scan stream already live");
            return Ok(AnalysisTicket::AlreadyInFlight);
        }

        let events = match self.client.stream_scan(&request).await {
            Ok(events) => events,
            Err(err) => {
                self.cache.release_producer(&scan_id);
                return Err(err);
            }
        };

        let cancel = CancelFlag::new();
        let join = {
            let cache = Arc::clone(&self.cache);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let outcome =
                    run_scan_session(events, &scan_id, &cache, handler.as_ref(), &cancel).await;
                cache.release_producer(&scan_id);
                outcome
            })
        };

        Ok(AnalysisTicket::Started(SessionHandle { cancel, join }))
    }

    /// Open a chat stream. Chat sessions are not keyed; every call opens
    /// its own stream.
    pub async fn open_chat(
        &self,
        request: &ChatRequest,
        handler: Arc<dyn ChatHandler>,
    ) -> PlatewiseResult<SessionHandle> {
        let events = self.client.stream_chat(request).await?;
        let cancel = CancelFlag::new();
        let join = {
            let cancel = cancel.clone();
            tokio::spawn(
                async move { run_chat_session(events, handler.as_ref(), &cancel).await },
            )
        };
        Ok(SessionHandle { cancel, join })
    }

    /// Start the polling fallback for a photo scan. Returns `None` when a
    /// producer is already live for the id.
    pub fn start_photo_poll(&self, scan_id: &str, on_update: UpdateCallback) -> Option<PollHandle> {
        let controller = PollController::new(
            Arc::clone(&self.client) as Arc<dyn ScanFetcher>,
            Arc::clone(&self.cache),
            self.poll_config,
        );
        controller.start(scan_id, on_update)
    }
}
