//! Polling fallback for scan kinds without push delivery.
//!
//! Photo scans get no SSE stream; after the caller's initial fetch returns
//! a non-terminal state, this controller re-fetches the scan on a fixed
//! interval and merges each snapshot through the cache until a terminal
//! state, a fetch error, or cancellation. Cancellation is observed before
//! every sleep and every fetch, so a cancelled controller performs no
//! further network calls or cache writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::ScanCache;
use crate::models::Scan;
use crate::traits::ScanFetcher;

/// Timing knobs for the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Grace period before the first poll, giving the server time to make
    /// progress past the state the initial fetch returned.
    pub warmup: Duration,
    /// Delay between consecutive polls.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(3),
            interval: Duration::from_secs(2),
        }
    }
}

/// How a poll loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Scan reached `done`
    Done,
    /// Scan reached `error`, or a fetch failed
    Failed,
    /// Cancelled before reaching a terminal state
    Cancelled,
}

/// Callback invoked with the merged cache entry after each applied update.
pub type UpdateCallback = Arc<dyn Fn(&Scan) + Send + Sync>;

/// Handle to a running poll loop. Dropping the handle cancels the loop:
/// when the interested party disappears, polling stops on its own.
pub struct PollHandle {
    cancel_tx: watch::Sender<bool>,
    join: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Request cancellation. Observed before the next sleep or fetch.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Wait for the loop to exit.
    pub async fn wait(self) -> PollOutcome {
        self.join.await.unwrap_or(PollOutcome::Cancelled)
    }
}

/// Periodic GET-by-id poller reconciling into the shared scan cache.
pub struct PollController {
    fetcher: Arc<dyn ScanFetcher>,
    cache: Arc<ScanCache>,
    config: PollConfig,
}

impl PollController {
    pub fn new(fetcher: Arc<dyn ScanFetcher>, cache: Arc<ScanCache>, config: PollConfig) -> Self {
        Self {
            fetcher,
            cache,
            config,
        }
    }

    /// Start polling `scan_id`. Claims the cache's producer slot; if a
    /// stream or poll loop is already live for the id this is a no-op and
    /// returns `None`.
    pub fn start(&self, scan_id: &str, on_update: UpdateCallback) -> Option<PollHandle> {
        if !self.cache.try_claim_producer(scan_id) {
            debug!(scan_id, "poll not started: producer already live");
            return None;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let config = self.config;
        let scan_id = scan_id.to_string();

        let join = tokio::spawn(async move {
            let outcome =
                poll_loop(&fetcher, &cache, config, &scan_id, on_update, cancel_rx).await;
            cache.release_producer(&scan_id);
            debug!(scan_id, ?outcome, "poll loop exited");
            outcome
        });

        Some(PollHandle { cancel_tx, join })
    }
}

async fn poll_loop(
    fetcher: &Arc<dyn ScanFetcher>,
    cache: &Arc<ScanCache>,
    config: PollConfig,
    scan_id: &str,
    on_update: UpdateCallback,
    mut cancel_rx: watch::Receiver<bool>,
) -> PollOutcome {
    // Warm-up grace period before the first poll. A closed channel means
    // the handle was dropped, which counts as cancellation.
    tokio::select! {
        _ = cancel_rx.changed() => return PollOutcome::Cancelled,
        _ = tokio::time::sleep(config.warmup) => {}
    }

    loop {
        if *cancel_rx.borrow() {
            return PollOutcome::Cancelled;
        }

        match fetcher.fetch_scan(scan_id).await {
            Ok(snapshot) => {
                let applied = cache.merge(scan_id, snapshot);
                let current = cache.get(scan_id);
                if applied {
                    if let Some(ref scan) = current {
                        on_update(scan);
                    }
                }
                if let Some(scan) = current {
                    if scan.lifecycle_state.is_terminal() {
                        return match scan.lifecycle_state {
                            crate::models::LifecycleState::Done => PollOutcome::Done,
                            _ => PollOutcome::Failed,
                        };
                    }
                }
            }
            Err(err) => {
                // Fetch failure stops the loop; retry only comes from an
                // explicit user action clearing the entry.
                warn!(scan_id, error = %err, "poll fetch failed");
                if cache.merge(scan_id, Scan::failed(scan_id, err.to_string())) {
                    if let Some(scan) = cache.get(scan_id) {
                        on_update(&scan);
                    }
                }
                return PollOutcome::Failed;
            }
        }

        tokio::select! {
            _ = cancel_rx.changed() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NetworkError, PlatewiseResult};
    use crate::models::LifecycleState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fetcher returning a scripted sequence of responses.
    struct ScriptedFetcher {
        responses: Mutex<Vec<PlatewiseResult<Scan>>>,
        fetch_count: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<PlatewiseResult<Scan>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                fetch_count: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScanFetcher for ScriptedFetcher {
        async fn fetch_scan(&self, scan_id: &str) -> PlatewiseResult<Scan> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                // Keep reporting a non-terminal state when the script runs dry
                Ok(Scan::stub(scan_id, LifecycleState::ProcessingImages))
            } else {
                responses.remove(0)
            }
        }
    }

    fn quick_config() -> PollConfig {
        PollConfig {
            warmup: Duration::from_millis(5),
            interval: Duration::from_millis(5),
        }
    }

    fn counting_callback() -> (UpdateCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let callback: UpdateCallback = Arc::new(move |_scan| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (callback, count)
    }

    #[tokio::test]
    async fn test_poll_until_done() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(Scan::stub("s1", LifecycleState::ProcessingImages)),
            Ok(Scan::stub("s1", LifecycleState::Analyzing)),
            Ok(Scan::stub("s1", LifecycleState::Done)),
        ]));
        let cache = Arc::new(ScanCache::new());
        let controller = PollController::new(
            Arc::clone(&fetcher) as Arc<dyn ScanFetcher>,
            Arc::clone(&cache),
            quick_config(),
        );

        let (callback, updates) = counting_callback();
        let handle = controller.start("s1", callback).unwrap();

        assert_eq!(handle.wait().await, PollOutcome::Done);
        assert_eq!(fetcher.fetches(), 3);
        assert_eq!(updates.load(Ordering::SeqCst), 3);
        assert_eq!(
            cache.get("s1").unwrap().lifecycle_state,
            LifecycleState::Done
        );
        assert!(!cache.has_live_producer("s1"));
    }

    #[tokio::test]
    async fn test_poll_fetch_error_merges_and_stops() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Err(NetworkError::Timeout {
            operation: "fetch_scan".to_string(),
            duration_secs: 30,
        }
        .into())]));
        let cache = Arc::new(ScanCache::new());
        let controller = PollController::new(
            Arc::clone(&fetcher) as Arc<dyn ScanFetcher>,
            Arc::clone(&cache),
            quick_config(),
        );

        let (callback, updates) = counting_callback();
        let handle = controller.start("s1", callback).unwrap();

        assert_eq!(handle.wait().await, PollOutcome::Failed);
        assert_eq!(updates.load(Ordering::SeqCst), 1);
        let cached = cache.get("s1").unwrap();
        assert_eq!(cached.lifecycle_state, LifecycleState::Error);
        assert!(cached.error_message.is_some());
    }

    #[tokio::test]
    async fn test_second_start_is_noop_while_live() {
        let fetcher = Arc::new(ScriptedFetcher::new(Vec::new()));
        let cache = Arc::new(ScanCache::new());
        let controller = PollController::new(
            Arc::clone(&fetcher) as Arc<dyn ScanFetcher>,
            Arc::clone(&cache),
            PollConfig {
                warmup: Duration::from_millis(50),
                interval: Duration::from_millis(50),
            },
        );

        let (callback, _) = counting_callback();
        let handle = controller.start("s1", Arc::clone(&callback)).unwrap();
        assert!(controller.start("s1", callback).is_none());

        handle.cancel();
        assert_eq!(handle.wait().await, PollOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_during_warmup_prevents_all_fetches() {
        let fetcher = Arc::new(ScriptedFetcher::new(Vec::new()));
        let cache = Arc::new(ScanCache::new());
        let controller = PollController::new(
            Arc::clone(&fetcher) as Arc<dyn ScanFetcher>,
            Arc::clone(&cache),
            PollConfig {
                warmup: Duration::from_secs(30),
                interval: Duration::from_secs(30),
            },
        );

        let (callback, updates) = counting_callback();
        let handle = controller.start("s1", callback).unwrap();
        handle.cancel();

        assert_eq!(handle.wait().await, PollOutcome::Cancelled);
        assert_eq!(fetcher.fetches(), 0);
        assert_eq!(updates.load(Ordering::SeqCst), 0);
        assert!(cache.get("s1").is_none());
        assert!(!cache.has_live_producer("s1"));
    }

    #[tokio::test]
    async fn test_unapplied_snapshot_does_not_invoke_callback() {
        // Cache already holds a later state than the first poll returns
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(Scan::stub("s1", LifecycleState::ProcessingImages)),
            Ok(Scan::stub("s1", LifecycleState::Done)),
        ]));
        let cache = Arc::new(ScanCache::new());
        cache.merge("s1", Scan::stub("s1", LifecycleState::Analyzing));

        let controller = PollController::new(
            Arc::clone(&fetcher) as Arc<dyn ScanFetcher>,
            Arc::clone(&cache),
            quick_config(),
        );

        let (callback, updates) = counting_callback();
        let handle = controller.start("s1", callback).unwrap();

        assert_eq!(handle.wait().await, PollOutcome::Done);
        // Only the terminal merge applied; the stale snapshot was discarded
        assert_eq!(updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_loop() {
        let fetcher = Arc::new(ScriptedFetcher::new(Vec::new()));
        let cache = Arc::new(ScanCache::new());
        let controller = PollController::new(
            Arc::clone(&fetcher) as Arc<dyn ScanFetcher>,
            Arc::clone(&cache),
            PollConfig {
                warmup: Duration::from_secs(30),
                interval: Duration::from_secs(30),
            },
        );

        let (callback, _) = counting_callback();
        let handle = controller.start("s1", callback).unwrap();
        drop(handle);

        // The loop notices the closed channel and releases the producer slot
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!cache.has_live_producer("s1"));
        assert_eq!(fetcher.fetches(), 0);
    }
}
