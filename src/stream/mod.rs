//! Stream-session driving: per-protocol dispatch and the read loop.
//!
//! # Module structure
//! - `dispatcher` - routes one typed event to caller handlers and decides
//!   whether the session terminates
//! - `session` - consumes a typed event stream, mirrors updates into the
//!   caches, and enforces the at-most-once error callback

mod dispatcher;
mod session;

pub use dispatcher::{dispatch_analysis, dispatch_chat, dispatch_scan, Flow};
pub use session::{
    run_analysis_session, run_chat_session, run_scan_session, CancelFlag, SessionOutcome,
};
