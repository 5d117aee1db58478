//! Frame decoder — turns a chunked byte stream into `data: <json>` frames.
//!
//! Chunk boundaries carry no meaning: a frame may be split across any number
//! of chunks, and one chunk may carry many frames. Bytes are buffered until a
//! `\n` arrives, so a multi-byte UTF-8 character split between chunks is
//! reassembled before it is parsed.
//!
//! Only lines starting with the literal prefix `data: ` are frames. Every
//! other line (blank separators, `event:` fields, comments) is dropped
//! without a trace.

use serde_json::Value;
use thiserror::Error;

/// Literal prefix that marks a frame line.
pub const DATA_PREFIX: &[u8] = b"data: ";

/// A single frame whose payload could not be used.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame payload {payload:?}: {source}")]
    Parse {
        payload: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Incremental line splitter + payload parser.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes after the last newline seen so far.
    pending: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the frames it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Value, FrameError>> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .filter_map(parse_line)
            .collect()
    }

    /// Bytes still waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume the decoder, returning the unterminated tail.
    ///
    /// The server terminates every frame, so a non-empty tail means the
    /// stream was cut short; it is never parsed.
    pub fn finish(self) -> Vec<u8> {
        self.pending
    }
}

/// Parse one complete line.
///
/// `None` for lines that are not frames; `Some(Err)` for frames whose
/// payload is not valid JSON.
pub fn parse_line(line: &[u8]) -> Option<Result<Value, FrameError>> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    Some(
        serde_json::from_slice(payload).map_err(|source| FrameError::Parse {
            payload: String::from_utf8_lossy(payload).into_owned(),
            source,
        }),
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
