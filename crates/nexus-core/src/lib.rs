//! Core crate for Nexus: configuration, shared stream types, and helpers.

pub mod config;
pub mod types;
pub mod utils;

pub use types::{StreamData, StreamEvent, StreamOutcome};
