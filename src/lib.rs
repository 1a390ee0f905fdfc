//! Client library for the Platewise food-scan and chat streaming API.
//!
//! The backend reports the progressive outcome of a product scan (barcode
//! lookup or photo identification) and of chat exchanges over long-lived
//! chunked HTTP responses. This crate frames those byte streams into event
//! records, decodes them into per-protocol typed events, drives the scan
//! lifecycle state machine, and reconciles push and poll updates into a
//! monotonic in-memory result cache.

pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod poll;
pub mod service;
pub mod sse;
pub mod stream;
pub mod traits;

pub use client::{EventStream, PlatewiseClient};
pub use service::{AnalysisService, AnalysisTicket, SessionHandle};
