//! Event-stream ingestion: framing, record decoding, typed events.
//!
//! The server pushes progress over a chunked HTTP response with
//! `text/event-stream` semantics. Each record is
//! - `event: <type>` - event type line (optional; some backends envelope it)
//! - `data: <payload>` - payload line(s), newline-joined
//! - a blank line (`\n\n` or `\r\n\r\n`) - record boundary
//!
//! # Module structure
//! - `framing` - byte-level record splitter ([`FrameReader`])
//! - `events` - typed events per protocol plus [`RawEvent`] / [`SseParseError`]
//! - `payloads` - internal payload deserialization structs
//! - `parser` - record decoding and per-protocol payload parsing

mod events;
mod framing;
mod parser;
mod payloads;

pub use events::{
    AnalysisEvent, ChatEvent, ChatFailure, ChatTurn, Protocol, RawEvent, ScanEvent,
    SseParseError, StreamFailure, TurnState,
};
pub use framing::FrameReader;
pub use parser::{decode_record, parse_analysis_event, parse_chat_event, parse_scan_event};
