//! Shared stream types — the snapshot callers poll and the typed view over
//! the payloads the conversation server emits.
//!
//! Messages stay raw `serde_json::Value`s as they arrive on the wire; the
//! [`StreamEvent`] view is layered on top for callers that want to render them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────
// Stream events (server payload vocabulary)
// ─────────────────────────────────────────────

/// One decoded frame payload, interpreted.
///
/// The server sends `{"type":"chunk","content":...}` for each piece of the
/// reply, `{"type":"complete"}` once it has finished, and
/// `{"type":"error","message":...}` when generation failed server-side.
/// Anything else is kept verbatim in [`StreamEvent::Other`].
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    Chunk { content: String },
    Complete,
    Error { message: String },
    Other(Value),
}

/// Wire shape of the known payloads.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownEvent {
    Chunk { content: String },
    Complete,
    Error { message: String },
}

impl StreamEvent {
    /// Interpret a decoded payload. Unknown shapes fall through to `Other`.
    pub fn from_value(value: &Value) -> Self {
        match KnownEvent::deserialize(value) {
            Ok(KnownEvent::Chunk { content }) => StreamEvent::Chunk { content },
            Ok(KnownEvent::Complete) => StreamEvent::Complete,
            Ok(KnownEvent::Error { message }) => StreamEvent::Error { message },
            Err(_) => StreamEvent::Other(value.clone()),
        }
    }
}

// ─────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────

/// Why a stream session reached its terminal state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StreamOutcome {
    /// The response body was read to the end.
    Completed,
    /// The caller cancelled the stream.
    Cancelled,
    /// Timeout, HTTP status error, or transport failure.
    Failed { error: String },
}

// ─────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────

/// Point-in-time copy of a stream session, as returned to pollers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamData {
    /// Decoded payloads in arrival order.
    pub messages: Vec<Value>,
    /// True once the session reached a terminal state. Never reset.
    pub is_done: bool,
    /// Set together with `is_done`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StreamOutcome>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StreamData {
    /// Typed view over every message received so far.
    pub fn events(&self) -> impl Iterator<Item = StreamEvent> + '_ {
        self.messages.iter().map(StreamEvent::from_value)
    }

    /// Concatenated `chunk` contents, in order.
    pub fn text(&self) -> String {
        self.events()
            .filter_map(|event| match event {
                StreamEvent::Chunk { content } => Some(content),
                _ => None,
            })
            .collect()
    }

    /// The first error message the server reported in-band, if any.
    pub fn server_error(&self) -> Option<String> {
        self.events().find_map(|event| match event {
            StreamEvent::Error { message } => Some(message),
            _ => None,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
