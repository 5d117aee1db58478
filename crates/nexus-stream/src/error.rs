//! Errors that end a stream session.
//!
//! None of these reach the caller of the manager's API; they are recorded
//! as the session's [`StreamOutcome`](nexus_core::types::StreamOutcome) and
//! logged. Per-frame problems are [`FrameError`](crate::decoder::FrameError).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// Response headers did not arrive in time; the request was aborted.
    #[error("no response headers within {after_ms} ms")]
    ConnectionTimeout { after_ms: u64 },

    /// The server answered with a non-success status. Body left unread.
    #[error("server responded with HTTP {status}")]
    HttpStatus { status: u16 },

    /// Network failure while sending or reading the body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The session's cancellation token fired for a reason other than timeout.
    #[error("stream cancelled")]
    Cancelled,
}
