//! Bridge to the persisted credential store.
//!
//! The core never talks to a storage engine directly. It hands boxed update
//! closures to a [`MetadataHandler`], which runs them against a
//! [`MetadataStore`] at its own discretion — synchronously, or deferred to
//! whatever scheduling the surrounding manager uses. The redb-backed store
//! in [`crate::storage`] is one implementation; tests substitute fakes.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The persisted record surface, keyed by identity.
pub trait MetadataStore: Send + Sync {
    /// Record the most recently known-good credential for `identity`,
    /// creating the record if absent and clearing any pending removal mark.
    fn set_state(&self, identity: &str, server_url: &str, token: &str)
        -> Result<(), MetadataError>;

    /// Soft-delete the record for `identity` so the store's owner can
    /// reconcile credential removal later. No-op if no record exists.
    fn mark_for_removal(&self, identity: &str) -> Result<(), MetadataError>;
}

/// An update staged against the persisted store.
pub type MetadataUpdate = Box<dyn FnOnce(&dyn MetadataStore) + Send>;

/// Schedules metadata updates on behalf of the external manager.
pub trait MetadataHandler: Send + Sync {
    /// Run `update` against the persisted store, now or later.
    fn perform_metadata_update(&self, update: MetadataUpdate);
}

/// A handler that runs every update synchronously against the wrapped store.
pub struct ImmediateMetadata {
    store: Arc<dyn MetadataStore>,
}

impl ImmediateMetadata {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }
}

impl MetadataHandler for ImmediateMetadata {
    fn perform_metadata_update(&self, update: MetadataUpdate) {
        update(self.store.as_ref());
    }
}

/// Per-user adapter in front of the handler.
///
/// Formats the update closures for one identity, skips persistence for
/// admin users (privileged credentials are never written to disk), and
/// absorbs store failures — the scheduling contract gives the user no
/// channel to observe a deferred outcome, so failures are logged instead
/// of propagated.
pub(crate) struct MetadataBridge {
    handler: Arc<dyn MetadataHandler>,
    identity: String,
    is_admin: bool,
    server_url: String,
}

impl MetadataBridge {
    pub fn new(
        handler: Arc<dyn MetadataHandler>,
        identity: String,
        server_url: String,
        is_admin: bool,
    ) -> Self {
        Self {
            handler,
            identity,
            is_admin,
            server_url,
        }
    }

    /// Schedule a `set_state` update carrying the current (server URL,
    /// token) pair.
    pub fn persist_state(&self, token: &str) {
        if self.is_admin {
            return;
        }
        let identity = self.identity.clone();
        let server_url = self.server_url.clone();
        let token = token.to_owned();
        self.handler
            .perform_metadata_update(Box::new(move |store: &dyn MetadataStore| {
                if let Err(err) = store.set_state(&identity, &server_url, &token) {
                    tracing::warn!(identity = %identity, error = %err, "Failed to persist credential state");
                }
            }));
    }

    /// Schedule a `mark_for_removal` update for this identity.
    pub fn persist_removal(&self) {
        if self.is_admin {
            return;
        }
        let identity = self.identity.clone();
        self.handler
            .perform_metadata_update(Box::new(move |store: &dyn MetadataStore| {
                if let Err(err) = store.mark_for_removal(&identity) {
                    tracing::warn!(identity = %identity, error = %err, "Failed to mark credential for removal");
                }
            }));
    }
}
