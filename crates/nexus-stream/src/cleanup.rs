//! Cleanup scheduler — retires finished sessions after a grace period.
//!
//! A finished session gets a removal deadline instead of a timer of its
//! own. Queries ignore entries past their deadline; a background sweeper
//! (and every `start_stream`) removes them for good.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::registry::SessionRegistry;

#[derive(Clone, Debug)]
pub struct CleanupScheduler {
    registry: SessionRegistry,
    grace: Duration,
}

impl CleanupScheduler {
    pub fn new(registry: SessionRegistry, grace: Duration) -> Self {
        Self { registry, grace }
    }

    /// Schedule removal of `id` once the grace period has elapsed.
    ///
    /// Only finished sessions are scheduled; for an active session this is
    /// a no-op and returns `false`.
    pub fn schedule(&self, id: &str) -> bool {
        let scheduled = self.registry.expire_at(id, Instant::now() + self.grace);
        if scheduled {
            debug!(
                conversation = %id,
                grace_ms = self.grace.as_millis() as u64,
                "Scheduled stream session removal"
            );
        }
        scheduled
    }

    /// Sweep expired sessions every `interval` until `shutdown` fires.
    pub fn spawn_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let registry = self.registry.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Session sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = registry.sweep();
                        if removed > 0 {
                            debug!(removed, "Swept expired stream sessions");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::types::StreamOutcome;

    fn finished_session(registry: &SessionRegistry, id: &str) {
        let stream_id = registry.try_insert(id, CancellationToken::new()).unwrap();
        registry.finish(id, stream_id, StreamOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_session_visible_during_grace() {
        let registry = SessionRegistry::new();
        let scheduler = CleanupScheduler::new(registry.clone(), Duration::from_secs(5));
        finished_session(&registry, "c1");

        assert!(scheduler.schedule("c1"));

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(registry.get("c1").is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(registry.get("c1").is_none());
        assert_eq!(registry.sweep(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_schedule_does_not_extend_grace() {
        let registry = SessionRegistry::new();
        let scheduler = CleanupScheduler::new(registry.clone(), Duration::from_secs(5));
        finished_session(&registry, "c1");
        assert!(scheduler.schedule("c1"));

        for _ in 0..10 {
            tokio::time::advance(Duration::from_secs(4)).await;
            scheduler.schedule("c1");
        }

        assert!(registry.get("c1").is_none());
        assert_eq!(registry.sweep(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_session_not_scheduled() {
        let registry = SessionRegistry::new();
        let scheduler = CleanupScheduler::new(registry.clone(), Duration::from_secs(5));
        registry.try_insert("c1", CancellationToken::new()).unwrap();

        assert!(!scheduler.schedule("c1"));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(registry.sweep(), 0);
        assert!(registry.has_active("c1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_sessions() {
        let registry = SessionRegistry::new();
        let scheduler = CleanupScheduler::new(registry.clone(), Duration::from_secs(5));
        let shutdown = CancellationToken::new();
        let sweeper = scheduler.spawn_sweeper(Duration::from_secs(1), shutdown.clone());

        finished_session(&registry, "c1");
        scheduler.schedule("c1");

        // Sleeping lets the paused clock run the sweeper's ticks
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(registry.sweep(), 0, "sweeper should already have removed it");
        assert!(registry.is_empty());

        shutdown.cancel();
        sweeper.await.unwrap();
    }
}
