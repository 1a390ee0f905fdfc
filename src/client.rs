//! Platewise API client.
//!
//! HTTP client for the Platewise backend: opens the streaming endpoints
//! (unified analysis, scan push, chat) and the GET-by-id poll endpoint.
//! Streaming responses are consumed as raw bytes and folded through the
//! frame reader and event decoder into a typed event stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::error::{classify_reqwest_error, NetworkError, PlatewiseError, PlatewiseResult, StreamError};
use crate::models::{AnalyzeRequest, ChatRequest, Scan, ScanStreamRequest};
use crate::sse::{
    decode_record, parse_analysis_event, parse_chat_event, parse_scan_event, AnalysisEvent,
    ChatEvent, FrameReader, Protocol, ScanEvent, SseParseError,
};
use crate::traits::ScanFetcher;

pub const DEFAULT_BASE_URL: &str = "https://api.platewise.dev";

/// Whole-request timeout for the analysis stream.
const ANALYSIS_STREAM_TIMEOUT: Duration = Duration::from_secs(90);
/// Whole-request timeout for scan and chat streams, which stay open longer.
const LONG_STREAM_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for single-shot fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed event stream returned by the streaming endpoints.
pub type EventStream<E> = Pin<Box<dyn Stream<Item = PlatewiseResult<E>> + Send>>;

/// Client for the Platewise backend API.
///
/// Holds a reusable HTTP client plus base URL and bearer token. One
/// instance per process is shared across sessions.
pub struct PlatewiseClient {
    pub base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl PlatewiseClient {
    /// Create a client against the default base URL.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            client: Client::new(),
        }
    }

    /// Create a client against a custom base URL.
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            client: Client::new(),
        }
    }

    /// Attach a bearer token for authorized endpoints.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Open the unified-analysis stream for a barcode lookup.
    pub async fn stream_analysis(
        &self,
        request: &AnalyzeRequest,
    ) -> PlatewiseResult<EventStream<AnalysisEvent>> {
        let response = self
            .open_stream("/v1/analysis/stream", request, ANALYSIS_STREAM_TIMEOUT)
            .await?;
        Ok(event_stream(
            response,
            Protocol::UnifiedAnalysis,
            parse_analysis_event,
        ))
    }

    /// Open the scan snapshot push stream.
    pub async fn stream_scan(
        &self,
        request: &ScanStreamRequest,
    ) -> PlatewiseResult<EventStream<ScanEvent>> {
        let response = self
            .open_stream("/v1/scans/stream", request, LONG_STREAM_TIMEOUT)
            .await?;
        Ok(event_stream(response, Protocol::BarcodeScan, parse_scan_event))
    }

    /// Open a chat stream.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> PlatewiseResult<EventStream<ChatEvent>> {
        let response = self
            .open_stream("/v1/chat/stream", request, LONG_STREAM_TIMEOUT)
            .await?;
        Ok(event_stream(response, Protocol::Chat, parse_chat_event))
    }

    /// Fetch one full scan snapshot by id (the polling endpoint).
    pub async fn get_scan(&self, scan_id: &str) -> PlatewiseResult<Scan> {
        let url = format!("{}/v1/scans/{}", self.base_url, scan_id);
        let mut request = self.client.get(&url).timeout(FETCH_TIMEOUT);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatewiseError::Network(classify_reqwest_error(&e, "get_scan")))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(NetworkError::NotFound {
                resource: format!("scan {}", scan_id),
            }
            .into());
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response.json::<Scan>().await?)
    }

    /// Check if the backend is healthy and reachable.
    pub async fn health_check(&self) -> PlatewiseResult<bool> {
        let url = format!("{}/v1/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| PlatewiseError::Network(classify_reqwest_error(&e, "health_check")))?;
        Ok(response.status().is_success())
    }

    /// POST a streaming request and validate the response status before
    /// any event is processed. Non-2xx surfaces here with no partial state.
    async fn open_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> PlatewiseResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .timeout(timeout)
            .json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatewiseError::Network(classify_reqwest_error(&e, path)))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(NetworkError::NotFound {
                resource: path.to_string(),
            }
            .into());
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(response)
    }
}

impl Default for PlatewiseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanFetcher for PlatewiseClient {
    async fn fetch_scan(&self, scan_id: &str) -> PlatewiseResult<Scan> {
        self.get_scan(scan_id).await
    }
}

struct StreamState<E, F> {
    bytes: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    reader: FrameReader,
    pending: VecDeque<E>,
    finished: bool,
    protocol: Protocol,
    parse: F,
}

impl<E, F> StreamState<E, F>
where
    F: Fn(&str, &str) -> Result<Option<E>, SseParseError>,
{
    /// Decode framed records into typed events. A record that fails to
    /// decode is logged and dropped; a single bad event must never
    /// terminate the session.
    fn decode_records(&mut self, records: Vec<String>) {
        for record in records {
            let Some(raw) = decode_record(&record) else {
                continue;
            };
            match (self.parse)(&raw.event_type, &raw.data) {
                Ok(Some(event)) => self.pending.push_back(event),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        protocol = self.protocol.name(),
                        event_type = %raw.event_type,
                        error = %err,
                        "dropping undecodable event record"
                    );
                }
            }
        }
    }
}

/// Fold a streaming response's bytes into typed events: frame reader ->
/// record decoder -> per-protocol parse. A transport failure is yielded
/// once as an `Err` item and ends the stream.
fn event_stream<E, F>(response: reqwest::Response, protocol: Protocol, parse: F) -> EventStream<E>
where
    E: Send + 'static,
    F: Fn(&str, &str) -> Result<Option<E>, SseParseError> + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(response.bytes_stream()),
        reader: FrameReader::new(),
        pending: VecDeque::new(),
        finished: false,
        protocol,
        parse,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let records = state.reader.feed(&chunk);
                    state.decode_records(records);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    let failure = StreamError::ConnectionLost {
                        message: err.to_string(),
                    };
                    return Some((Err(failure.into()), state));
                }
                None => {
                    // End of stream: flush any unterminated final record
                    state.finished = true;
                    if let Some(rest) = state.reader.finish() {
                        state.decode_records(vec![rest]);
                    }
                }
            }
        }
    }))
}
