//! Client-side streaming session manager for Nexus conversations.
//!
//! Posts a message to the conversation server, reads the chunked
//! `data: <json>` response as it arrives, and exposes the accumulating
//! messages to pollers while the transfer is in progress.
//!
//! # Architecture
//!
//! - [`manager::StreamManager`] — public contract: start, poll, cancel
//! - [`registry::SessionRegistry`] — one session per conversation id
//! - [`decoder::FrameDecoder`] — byte chunks → `data:` frames → JSON values
//! - [`guard::TimeoutGuard`] — aborts requests whose headers never arrive
//! - [`cleanup::CleanupScheduler`] — retires finished sessions after a grace period

pub mod cleanup;
pub mod decoder;
pub mod error;
pub mod guard;
pub mod manager;
mod pump;
pub mod registry;

// Re-export main types for convenience
pub use decoder::{FrameDecoder, FrameError};
pub use error::StreamError;
pub use manager::{StreamManager, StreamSettings, MIN_GRACE_PERIOD};
pub use nexus_core::types::{StreamData, StreamEvent, StreamOutcome};
pub use registry::SessionRegistry;
