//! Trait abstractions for dependency injection and test doubles.

mod fetch;
mod handlers;

pub use fetch::ScanFetcher;
pub use handlers::{AnalysisHandler, ChatHandler, ScanHandler};
