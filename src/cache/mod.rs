//! Process-lifetime scan result cache.
//!
//! The cache is the only shared mutable state between the stream session,
//! the polling fallback, and UI reads. It exclusively owns all entries;
//! producers submit candidate updates through [`ScanCache::merge`] and
//! never write entries directly. Entries live for the process lifetime
//! (session-scoped, never persisted); `clear` exists only for the explicit
//! user-triggered retry path.

mod analysis;
mod reconcile;

pub use analysis::AnalysisStore;

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::models::Scan;

#[derive(Debug, Default)]
struct CacheInner {
    scans: HashMap<String, Scan>,
    /// Keys with a live producer (stream session or poll loop). At most
    /// one producer per key; callers claim before spawning.
    live_producers: HashSet<String>,
}

/// Keyed store of the most current known result per scan id or barcode,
/// with a monotonic merge.
///
/// Every operation takes the single internal lock once; `merge` is one
/// critical section covering compare-and-replace, which is what protects
/// UI reads racing a producer write.
#[derive(Debug, Default)]
pub struct ScanCache {
    inner: Mutex<CacheInner>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a candidate update for `key`. Inserts when absent; otherwise
    /// applies only a non-regressing update (see `reconcile`). Returns
    /// whether the candidate was applied.
    pub fn merge(&self, key: &str, candidate: Scan) -> bool {
        let mut inner = self.inner.lock().expect("scan cache poisoned");
        let now = Utc::now();

        match inner.scans.get(key) {
            None => {
                let mut entry = candidate;
                entry.created_at = entry.created_at.or(Some(now));
                entry.last_activity_at = Some(now);
                inner.scans.insert(key.to_string(), entry);
                true
            }
            Some(current) => match reconcile::reconcile(current, candidate) {
                Some(mut merged) => {
                    merged.last_activity_at = Some(now);
                    inner.scans.insert(key.to_string(), merged);
                    true
                }
                None => {
                    debug!(key, "discarded non-superseding scan update");
                    false
                }
            },
        }
    }

    /// Current known state for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Scan> {
        self.inner
            .lock()
            .expect("scan cache poisoned")
            .scans
            .get(key)
            .cloned()
    }

    /// Drop the entry for `key`. Used only on explicit user retry to force
    /// a clean re-fetch.
    pub fn clear(&self, key: &str) {
        self.inner
            .lock()
            .expect("scan cache poisoned")
            .scans
            .remove(key);
    }

    /// Claim the producer slot for `key`. Returns false when a stream or
    /// poll loop is already live for it; the caller must not spawn another.
    pub fn try_claim_producer(&self, key: &str) -> bool {
        self.inner
            .lock()
            .expect("scan cache poisoned")
            .live_producers
            .insert(key.to_string())
    }

    /// Release the producer slot for `key` when its stream or poll loop
    /// exits.
    pub fn release_producer(&self, key: &str) {
        self.inner
            .lock()
            .expect("scan cache poisoned")
            .live_producers
            .remove(key);
    }

    /// Whether a producer is currently live for `key`.
    pub fn has_live_producer(&self, key: &str) -> bool {
        self.inner
            .lock()
            .expect("scan cache poisoned")
            .live_producers
            .contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, LifecycleState, ProductInfo};

    #[test]
    fn test_insert_on_first_observation() {
        let cache = ScanCache::new();
        assert!(cache.merge("s1", Scan::stub("s1", LifecycleState::FetchingProductInfo)));

        let entry = cache.get("s1").unwrap();
        assert_eq!(entry.lifecycle_state, LifecycleState::FetchingProductInfo);
        assert!(entry.created_at.is_some());
        assert!(entry.last_activity_at.is_some());
    }

    #[test]
    fn test_done_is_never_regressed() {
        let cache = ScanCache::new();

        let mut done = Scan::stub("s1", LifecycleState::Done);
        done.analysis_result = Some(AnalysisResult::default());
        assert!(cache.merge("s1", done));

        // Late out-of-order update must be discarded
        assert!(!cache.merge("s1", Scan::stub("s1", LifecycleState::Analyzing)));

        let entry = cache.get("s1").unwrap();
        assert_eq!(entry.lifecycle_state, LifecycleState::Done);
        assert!(entry.analysis_result.is_some());
    }

    #[test]
    fn test_state_equals_max_of_applied_candidates() {
        let cache = ScanCache::new();
        let states = [
            LifecycleState::Analyzing,
            LifecycleState::FetchingProductInfo,
            LifecycleState::ProcessingImages,
            LifecycleState::Done,
            LifecycleState::Analyzing,
        ];
        for state in states {
            cache.merge("s1", Scan::stub("s1", state));
        }
        assert_eq!(
            cache.get("s1").unwrap().lifecycle_state,
            LifecycleState::Done
        );
    }

    #[test]
    fn test_clear_forces_clean_refetch() {
        let cache = ScanCache::new();
        cache.merge("s1", Scan::failed("s1", "boom"));
        cache.clear("s1");
        assert!(cache.get("s1").is_none());

        // After clear, even an early state inserts again
        assert!(cache.merge("s1", Scan::stub("s1", LifecycleState::FetchingProductInfo)));
    }

    #[test]
    fn test_producer_guard_is_exclusive() {
        let cache = ScanCache::new();
        assert!(cache.try_claim_producer("s1"));
        assert!(!cache.try_claim_producer("s1"));
        assert!(cache.has_live_producer("s1"));

        cache.release_producer("s1");
        assert!(!cache.has_live_producer("s1"));
        assert!(cache.try_claim_producer("s1"));
    }

    #[test]
    fn test_producer_guard_is_per_key() {
        let cache = ScanCache::new();
        assert!(cache.try_claim_producer("s1"));
        assert!(cache.try_claim_producer("s2"));
    }

    #[test]
    fn test_merge_fills_product_info_at_same_state() {
        let cache = ScanCache::new();
        cache.merge("s1", Scan::stub("s1", LifecycleState::Analyzing));

        let mut update = Scan::stub("s1", LifecycleState::Analyzing);
        update.product_info = Some(ProductInfo::named("Soda"));
        assert!(cache.merge("s1", update));

        assert_eq!(cache.get("s1").unwrap().product_info.unwrap().name, "Soda");
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        use std::sync::Arc;
        let cache = Arc::new(ScanCache::new());
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for state in [
                    LifecycleState::FetchingProductInfo,
                    LifecycleState::ProcessingImages,
                    LifecycleState::Analyzing,
                    LifecycleState::Done,
                ] {
                    cache.merge("s1", Scan::stub("s1", state));
                }
            })
        };
        // UI-style reads racing the producer writes
        for _ in 0..100 {
            if let Some(scan) = cache.get("s1") {
                assert_eq!(scan.id, "s1");
            }
        }
        writer.join().unwrap();
        assert_eq!(
            cache.get("s1").unwrap().lifecycle_state,
            LifecycleState::Done
        );
    }
}
