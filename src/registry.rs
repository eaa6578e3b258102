//! Endpoint-keyed registry of weak session handles.
//!
//! Two disjoint-by-key pools: `active` holds sessions that should be live,
//! `waiting` holds sessions parked across a logout. Handles never keep a
//! session alive; a handle whose target has been destroyed (or has errored
//! out) is purged opportunistically on the next access rather than by an
//! eager sweep.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::session::Session;

pub(crate) type SessionHandle = Weak<dyn Session>;

#[derive(Default)]
pub(crate) struct SessionRegistry {
    active: HashMap<String, SessionHandle>,
    waiting: HashMap<String, SessionHandle>,
}

impl SessionRegistry {
    /// Resolve every live, non-errored active session.
    ///
    /// Stale entries encountered along the way are removed, amortizing
    /// cleanup over normal reads.
    pub fn live_sessions(&mut self) -> Vec<Arc<dyn Session>> {
        let mut sessions = Vec::with_capacity(self.active.len());
        self.active.retain(|url, handle| match handle.upgrade() {
            Some(session) if !session.is_in_error_state() => {
                sessions.push(session);
                true
            }
            _ => {
                tracing::debug!(url = %url, "Purged stale session handle");
                false
            }
        });
        sessions
    }

    /// Resolve the active session for `url`, purging the entry if its
    /// target no longer exists.
    pub fn session_for_url(&mut self, url: &str) -> Option<Arc<dyn Session>> {
        let session = self.active.get(url)?.upgrade();
        if session.is_none() {
            self.active.remove(url);
            tracing::debug!(url = %url, "Purged stale session handle");
        }
        session
    }

    /// Whether a live handle for `url` exists in either pool.
    pub fn is_registered(&self, url: &str) -> bool {
        let has_live = |pool: &HashMap<String, SessionHandle>| {
            pool.get(url).is_some_and(|handle| handle.strong_count() > 0)
        };
        has_live(&self.active) || has_live(&self.waiting)
    }

    pub fn insert_active(&mut self, url: String, session: &Arc<dyn Session>) {
        self.active.insert(url, Arc::downgrade(session));
    }

    pub fn insert_waiting(&mut self, url: String, session: &Arc<dyn Session>) {
        self.waiting.insert(url, Arc::downgrade(session));
    }

    /// Move every resolvable active handle into the waiting pool, clearing
    /// the active pool. Returns the resolved sessions so the caller can
    /// notify them; unresolvable handles are dropped.
    pub fn park_active(&mut self) -> Vec<Arc<dyn Session>> {
        let mut parked = Vec::with_capacity(self.active.len());
        for (url, handle) in self.active.drain() {
            if let Some(session) = handle.upgrade() {
                parked.push(session);
                self.waiting.insert(url, handle);
            }
        }
        parked
    }

    /// Move every resolvable waiting handle back into the active pool,
    /// clearing the waiting pool. Returns the resolved sessions so the
    /// caller can revive them once the lock is released.
    pub fn revive_waiting(&mut self) -> Vec<Arc<dyn Session>> {
        let mut revived = Vec::with_capacity(self.waiting.len());
        for (url, handle) in self.waiting.drain() {
            if let Some(session) = handle.upgrade() {
                revived.push(session);
                self.active.insert(url, handle);
            }
        }
        revived
    }
}
