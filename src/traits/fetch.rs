//! Scan fetching trait abstraction.
//!
//! The polling fallback controller fetches through this trait so its loop
//! can be exercised in tests with a scripted fetcher instead of a live
//! backend.

use async_trait::async_trait;

use crate::error::PlatewiseResult;
use crate::models::Scan;

/// Pull one full scan snapshot by id.
#[async_trait]
pub trait ScanFetcher: Send + Sync {
    async fn fetch_scan(&self, scan_id: &str) -> PlatewiseResult<Scan>;
}
