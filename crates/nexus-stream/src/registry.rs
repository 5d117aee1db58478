//! Session registry — one stream session per conversation id.
//!
//! The registry is the only shared mutable state of the manager. Every
//! operation takes the lock once, does its check and its mutation, and
//! releases it before returning; nothing holds it across an `.await`.
//!
//! Finished sessions carry an `expires_at` deadline set by the cleanup
//! scheduler. Expired entries are invisible to queries and are physically
//! removed by [`SessionRegistry::sweep`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use nexus_core::types::{StreamData, StreamOutcome};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

// ─────────────────────────────────────────────
// Session entry
// ─────────────────────────────────────────────

/// Mutable record of one streamed exchange.
#[derive(Debug)]
struct StreamSession {
    /// Generation marker; pump writes must carry the same id.
    stream_id: Uuid,
    messages: Vec<Value>,
    cancel: CancellationToken,
    is_done: bool,
    outcome: Option<StreamOutcome>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    expires_at: Option<Instant>,
}

impl StreamSession {
    fn new(cancel: CancellationToken) -> Self {
        Self {
            stream_id: Uuid::new_v4(),
            messages: Vec::new(),
            cancel,
            is_done: false,
            outcome: None,
            started_at: Utc::now(),
            finished_at: None,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Transition to Done. Monotonic: the first outcome wins.
    fn finish(&mut self, outcome: StreamOutcome) -> bool {
        if self.is_done {
            return false;
        }
        self.is_done = true;
        self.outcome = Some(outcome);
        self.finished_at = Some(Utc::now());
        true
    }

    fn snapshot(&self) -> StreamData {
        StreamData {
            messages: self.messages.clone(),
            is_done: self.is_done,
            outcome: self.outcome.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

// ─────────────────────────────────────────────
// SessionRegistry
// ─────────────────────────────────────────────

/// Keyed store of stream sessions, shared by the manager, pump tasks and
/// the cleanup scheduler.
///
/// Cloning is cheap; all clones see the same sessions.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, StreamSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session for `id`, unless one already exists.
    ///
    /// Expired entries are swept first, so a session whose grace window
    /// has passed does not block a new one. Returns the new session's
    /// generation id, or `None` if a session is already registered.
    pub(crate) fn try_insert(&self, id: &str, cancel: CancellationToken) -> Option<Uuid> {
        let mut sessions = self.sessions.write().unwrap();
        sweep_locked(&mut sessions, Instant::now());

        if sessions.contains_key(id) {
            return None;
        }
        let session = StreamSession::new(cancel);
        let stream_id = session.stream_id;
        sessions.insert(id.to_string(), session);
        Some(stream_id)
    }

    /// Snapshot of the session for `id`, or `None` if absent or expired.
    pub fn get(&self, id: &str) -> Option<StreamData> {
        let now = Instant::now();
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(id)
            .filter(|s| !s.is_expired(now))
            .map(StreamSession::snapshot)
    }

    /// True only if a session exists for `id` and has not finished.
    pub fn has_active(&self, id: &str) -> bool {
        let sessions = self.sessions.read().unwrap();
        sessions.get(id).is_some_and(|s| !s.is_done)
    }

    /// True if any unexpired session exists, finished or not.
    pub fn has_any(&self) -> bool {
        let now = Instant::now();
        let sessions = self.sessions.read().unwrap();
        sessions.values().any(|s| !s.is_expired(now))
    }

    /// Number of unexpired sessions.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let sessions = self.sessions.read().unwrap();
        sessions.values().filter(|s| !s.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a decoded payload to the session of generation `stream_id`.
    ///
    /// Returns `false` if that session is gone, replaced, or already done;
    /// the caller should stop pumping.
    pub(crate) fn append(&self, id: &str, stream_id: Uuid, message: Value) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.get_mut(id) {
            Some(s) if s.stream_id == stream_id && !s.is_done => {
                s.messages.push(message);
                true
            }
            _ => false,
        }
    }

    /// Mark the session of generation `stream_id` as done.
    ///
    /// Returns `true` if this call performed the transition.
    pub(crate) fn finish(&self, id: &str, stream_id: Uuid, outcome: StreamOutcome) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.get_mut(id) {
            Some(s) if s.stream_id == stream_id => s.finish(outcome),
            _ => false,
        }
    }

    /// Stamp a removal deadline on a finished session.
    ///
    /// The first deadline sticks; later calls never postpone it. Returns
    /// `false` if the session is absent or still active.
    pub(crate) fn expire_at(&self, id: &str, deadline: Instant) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        match sessions.get_mut(id) {
            Some(s) if s.is_done => {
                s.expires_at.get_or_insert(deadline);
                true
            }
            _ => false,
        }
    }

    /// Cancel and remove the session for `id` in one step.
    ///
    /// The cancellation token fires and the session is marked done before
    /// the entry is dropped. Returns `false` if no session existed.
    pub(crate) fn cancel(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        let Some(mut session) = sessions.remove(id) else {
            return false;
        };
        session.cancel.cancel();
        session.finish(StreamOutcome::Cancelled);
        true
    }

    /// Cancel every in-flight session, leaving entries in place.
    pub(crate) fn cancel_all(&self) {
        let sessions = self.sessions.read().unwrap();
        for session in sessions.values().filter(|s| !s.is_done) {
            session.cancel.cancel();
        }
    }

    /// Remove every expired session. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Remove every session whose deadline is at or before `now`.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        sweep_locked(&mut sessions, now)
    }
}

fn sweep_locked(sessions: &mut HashMap<String, StreamSession>, now: Instant) -> usize {
    let before = sessions.len();
    sessions.retain(|id, s| {
        let keep = !s.is_expired(now);
        if !keep {
            debug!(conversation = %id, "Removed expired stream session");
        }
        keep
    });
    before - sessions.len()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
