//! Connection timeout guard.
//!
//! Armed when a stream request is issued; if response headers have not
//! arrived when it fires, it cancels the session's token so the pump's
//! pending `send` resolves into the abort path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// A one-shot deferred cancellation. Disarmed explicitly or on drop.
#[derive(Debug)]
pub struct TimeoutGuard {
    timer: Option<JoinHandle<()>>,
    fired: Arc<AtomicBool>,
    after: Duration,
}

impl TimeoutGuard {
    /// Spawn the timer. Must be called from within a tokio runtime.
    pub fn arm(token: CancellationToken, after: Duration, conversation_id: &str) -> Self {
        let fired = Arc::new(AtomicBool::new(false));
        let conversation_id = conversation_id.to_string();

        let timer = tokio::spawn({
            let fired = fired.clone();
            async move {
                tokio::time::sleep(after).await;
                fired.store(true, Ordering::SeqCst);
                error!(
                    conversation = %conversation_id,
                    timeout_ms = after.as_millis() as u64,
                    "Connection timeout, aborting stream"
                );
                token.cancel();
            }
        });

        Self {
            timer: Some(timer),
            fired,
            after,
        }
    }

    /// Stop the timer. Has no effect if it already fired.
    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Whether the timer ran out and cancelled the token.
    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn after(&self) -> Duration {
        self.after
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.disarm();
    }
}
