//! Transport pump — drives one stream session from request to Done.
//!
//! One task per session. Every suspension point (`send`, each body read)
//! races the session's cancellation token, so the task always ends.

use std::time::Duration;

use futures_util::StreamExt;
use nexus_core::types::StreamOutcome;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cleanup::CleanupScheduler;
use crate::decoder::FrameDecoder;
use crate::error::StreamError;
use crate::guard::TimeoutGuard;
use crate::registry::SessionRegistry;

/// Everything a pump task needs, moved into the task.
pub(crate) struct Pump {
    pub client: reqwest::Client,
    pub registry: SessionRegistry,
    pub cleanup: CleanupScheduler,
    pub conversation_id: String,
    pub stream_id: Uuid,
    pub url: String,
    pub content: String,
    pub token: CancellationToken,
    pub connect_timeout: Duration,
}

impl Pump {
    /// Run to completion: stream, record the outcome, schedule cleanup.
    pub async fn run(self) {
        let outcome = match self.stream().await {
            Ok(()) => StreamOutcome::Completed,
            Err(StreamError::Cancelled) => {
                debug!(conversation = %self.conversation_id, "Stream cancelled");
                StreamOutcome::Cancelled
            }
            Err(e) => {
                error!(conversation = %self.conversation_id, error = %e, "Stream failed");
                StreamOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        if self
            .registry
            .finish(&self.conversation_id, self.stream_id, outcome)
        {
            info!(conversation = %self.conversation_id, "Stream finished");
            self.cleanup.schedule(&self.conversation_id);
        }
    }

    async fn stream(&self) -> Result<(), StreamError> {
        let id = &self.conversation_id;
        let mut guard = TimeoutGuard::arm(self.token.clone(), self.connect_timeout, id);

        debug!(conversation = %id, url = %self.url, "Opening stream");
        let request = self
            .client
            .post(&self.url)
            .json(&json!({ "content": self.content }))
            .send();

        let response = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                return Err(if guard.fired() {
                    StreamError::ConnectionTimeout {
                        after_ms: guard.after().as_millis() as u64,
                    }
                } else {
                    StreamError::Cancelled
                });
            }
            result = request => result?,
        };
        guard.disarm();

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::HttpStatus {
                status: status.as_u16(),
            });
        }
        debug!(conversation = %id, status = %status, "Stream headers received");

        let mut body = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut received = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Err(StreamError::Cancelled),
                next = body.next() => next,
            };

            let chunk = match next {
                Some(chunk) => chunk?,
                None => break,
            };

            for frame in decoder.push(&chunk) {
                match frame {
                    Ok(message) => {
                        if !self.registry.append(id, self.stream_id, message) {
                            // Session cancelled or replaced under us
                            return Err(StreamError::Cancelled);
                        }
                        received += 1;
                    }
                    Err(e) => warn!(conversation = %id, error = %e, "Discarding malformed frame"),
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            debug!(
                conversation = %id,
                bytes = tail.len(),
                "Dropping unterminated trailing line"
            );
        }
        debug!(conversation = %id, messages = received, "Stream body exhausted");
        Ok(())
    }
}
