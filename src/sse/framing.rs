//! Byte-level record framing for event streams.
//!
//! Splits an incoming byte sequence into complete event records at record
//! boundaries. Works on raw bytes and decodes to text only once a full
//! record is isolated, so a multi-byte UTF-8 character split across chunk
//! boundaries is never corrupted.

/// Record separators accepted from the server, in the two line-ending
/// conventions seen in the wild.
const SEP_LF: &[u8] = b"\n\n";
const SEP_CRLF: &[u8] = b"\r\n\r\n";

/// Stateful frame reader that accumulates bytes and emits complete records.
///
/// Chunk boundaries carry no semantic meaning: `feed` may be called with a
/// single byte or an entire response body and produces the same records.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly received bytes and drain every complete record.
    ///
    /// A record is the text before a separator (`\n\n` or `\r\n\r\n`);
    /// the separator itself is consumed. Bytes after the last separator
    /// stay buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some((pos, sep_len)) = find_separator(&self.buffer) {
            let text = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
            self.buffer.drain(..pos + sep_len);
            records.push(text);
        }
        records
    }

    /// End-of-stream: emit a non-empty, non-whitespace remainder as one
    /// final record. Servers occasionally omit the trailing separator on
    /// the last record before closing the connection.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest).into_owned();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Bytes currently held back waiting for a record boundary.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

/// Earliest separator in `buf` as `(position, length)`.
fn find_separator(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find_subsequence(buf, SEP_LF).map(|p| (p, SEP_LF.len()));
    let crlf = find_subsequence(buf, SEP_CRLF).map(|p| (p, SEP_CRLF.len()));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
