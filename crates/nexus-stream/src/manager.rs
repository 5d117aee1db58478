//! `StreamManager` — the public face of the streaming core.
//!
//! Owned by the application's composition root and passed to whoever needs
//! it; there is no global instance. Cloning is cheap and every clone shares
//! the same registry.
//!
//! ```no_run
//! # async fn demo() {
//! use nexus_stream::{StreamManager, StreamSettings};
//!
//! let manager = StreamManager::new(StreamSettings::default());
//! manager.start_stream("42", "hello", "http://127.0.0.1:5000");
//! if let Some(data) = manager.get_stream_data("42") {
//!     println!("{} messages, done: {}", data.messages.len(), data.is_done);
//! }
//! # }
//! ```

use std::time::Duration;

use nexus_core::config::StreamConfig;
use nexus_core::types::StreamData;
use nexus_core::utils::stream_url;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::cleanup::CleanupScheduler;
use crate::pump::Pump;
use crate::registry::SessionRegistry;

// ─────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────

/// Shortest grace period the manager accepts; a finished session must stay
/// readable long enough for a poller to see `is_done`.
pub const MIN_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Timing knobs of the manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamSettings {
    /// Wait for response headers at most this long.
    pub connect_timeout: Duration,
    /// Finished sessions stay queryable this long (at least [`MIN_GRACE_PERIOD`]).
    pub grace_period: Duration,
    /// Background sweep interval; `None` sweeps only on access.
    pub sweep_interval: Option<Duration>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

impl From<&StreamConfig> for StreamSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            grace_period: Duration::from_millis(config.grace_period_ms),
            sweep_interval: (config.sweep_interval_ms > 0)
                .then(|| Duration::from_millis(config.sweep_interval_ms)),
        }
    }
}

// ─────────────────────────────────────────────
// StreamManager
// ─────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct StreamManager {
    /// HTTP client (shared, connection-pooled). No overall timeout: streams are long-lived.
    client: reqwest::Client,
    registry: SessionRegistry,
    cleanup: CleanupScheduler,
    settings: StreamSettings,
    /// Pump tasks, so callers can wait for them to end.
    pumps: TaskTracker,
    /// Stops the background sweeper.
    shutdown: CancellationToken,
}

impl StreamManager {
    pub fn new(settings: StreamSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, …).
    pub fn with_client(client: reqwest::Client, mut settings: StreamSettings) -> Self {
        if settings.grace_period < MIN_GRACE_PERIOD {
            warn!(
                grace_ms = settings.grace_period.as_millis() as u64,
                min_ms = MIN_GRACE_PERIOD.as_millis() as u64,
                "Grace period too short, raising it"
            );
            settings.grace_period = MIN_GRACE_PERIOD;
        }
        let registry = SessionRegistry::new();
        let cleanup = CleanupScheduler::new(registry.clone(), settings.grace_period);
        Self {
            client,
            registry,
            cleanup,
            settings,
            pumps: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start streaming `input_text` into conversation `conversation_id`.
    ///
    /// Fire-and-forget: progress is observed through
    /// [`get_stream_data`](Self::get_stream_data). A no-op (logged) if a
    /// session for this conversation already exists. Must be called from
    /// within a tokio runtime.
    pub fn start_stream(&self, conversation_id: &str, input_text: &str, base_url: &str) {
        let token = CancellationToken::new();
        let Some(stream_id) = self.registry.try_insert(conversation_id, token.clone()) else {
            warn!(conversation = %conversation_id, "Stream already active for conversation");
            return;
        };

        info!(conversation = %conversation_id, stream = %stream_id, "Starting stream");

        let pump = Pump {
            client: self.client.clone(),
            registry: self.registry.clone(),
            cleanup: self.cleanup.clone(),
            conversation_id: conversation_id.to_string(),
            stream_id,
            url: stream_url(base_url, conversation_id),
            content: input_text.to_string(),
            token,
            connect_timeout: self.settings.connect_timeout,
        };
        self.pumps.spawn(pump.run());
    }

    /// Snapshot of the session, or `None` if there is none (or it was retired).
    pub fn get_stream_data(&self, conversation_id: &str) -> Option<StreamData> {
        self.registry.get(conversation_id)
    }

    /// True while a session for this conversation is still streaming.
    pub fn has_active_stream(&self, conversation_id: &str) -> bool {
        self.registry.has_active(conversation_id)
    }

    /// True if any session is registered, finished or not.
    pub fn has_active_streams(&self) -> bool {
        self.registry.has_any()
    }

    /// Abort the transport and remove the session immediately.
    pub fn cancel_stream(&self, conversation_id: &str) {
        if self.registry.cancel(conversation_id) {
            info!(conversation = %conversation_id, "Stream cancelled by caller");
        } else {
            debug!(conversation = %conversation_id, "No stream to cancel");
        }
    }

    /// Schedule removal of a finished session after the grace period.
    ///
    /// No-op for sessions that are still streaming.
    pub fn cleanup(&self, conversation_id: &str) -> bool {
        self.cleanup.schedule(conversation_id)
    }

    /// Start the background sweeper, if the settings ask for one.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        let interval = self.settings.sweep_interval?;
        Some(self.cleanup.spawn_sweeper(interval, self.shutdown.child_token()))
    }

    /// Stop the sweeper and cancel every in-flight stream.
    ///
    /// Cancelled sessions still finish through their pumps and remain
    /// queryable for the grace period.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.registry.cancel_all();
    }

    /// Wait until every pump task spawned so far has ended.
    ///
    /// Pumps end on their own once their session is done or cancelled; call
    /// this after [`shutdown`](Self::shutdown) to let in-flight requests
    /// be dropped before the runtime goes away.
    pub async fn drain(&self) {
        self.pumps.close();
        self.pumps.wait().await;
        self.pumps.reopen();
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
