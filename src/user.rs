//! The user aggregate: credential state machine plus session registry
//! behind a single exclusive lock.
//!
//! Locking discipline: every operation that touches credentials or the
//! registry is a short critical section under one mutex. Side effects that
//! call into externally-owned sessions and might re-enter this user
//! (revival after a token update or registration) are computed under the
//! lock into a private snapshot, then performed after the lock is
//! released. Leaf calls that are guaranteed not to re-enter — admin
//! binding during registration, the per-session logout notification —
//! stay in-line under the lock.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::credentials::{Credentials, TokenTransition, UserState};
use crate::metadata::{MetadataBridge, MetadataHandler};
use crate::registry::SessionRegistry;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A live session is already registered for the endpoint.
    #[error("a session is already registered for {url}")]
    DuplicateEndpoint { url: String },
}

/// Construction parameters for a [`User`].
#[derive(Debug, Clone)]
pub struct UserConfig {
    /// Opaque identity, immutable after construction.
    pub identity: String,
    /// Privileged users are never logged out or persisted.
    pub is_admin: bool,
    /// The credential the user starts out with.
    pub refresh_token: String,
    /// Server the credential authenticates against.
    pub server_url: String,
}

/// A logical user: login state, refresh token, and the registry of
/// network sessions bound to it.
pub struct User {
    identity: String,
    inner: Mutex<Inner>,
    is_admin: bool,
    metadata: MetadataBridge,
    server_url: String,
}

struct Inner {
    credentials: Credentials,
    registry: SessionRegistry,
}

impl User {
    /// Construct a user in the `Active` state.
    ///
    /// Non-admin users immediately schedule a persisted-state update so
    /// the store reflects the initial credential.
    pub fn new(config: UserConfig, handler: Arc<dyn MetadataHandler>) -> Self {
        let UserConfig {
            identity,
            is_admin,
            refresh_token,
            server_url,
        } = config;
        let metadata = MetadataBridge::new(
            handler,
            identity.clone(),
            server_url.clone(),
            is_admin,
        );
        let user = Self {
            identity,
            inner: Mutex::new(Inner {
                credentials: Credentials::new(refresh_token.clone()),
                registry: SessionRegistry::default(),
            }),
            is_admin,
            metadata,
            server_url,
        };
        user.metadata.persist_state(&refresh_token);
        user
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Current login state.
    pub fn state(&self) -> UserState {
        self.inner.lock().credentials.state
    }

    /// Current refresh token.
    pub fn refresh_token(&self) -> String {
        self.inner.lock().credentials.refresh_token.clone()
    }

    /// Every live, non-errored session bound to this user.
    ///
    /// Stale registry entries are purged as a side effect of the read.
    /// Empty once the user has been invalidated.
    pub fn all_sessions(&self) -> Vec<Arc<dyn Session>> {
        let mut inner = self.inner.lock();
        if inner.credentials.state == UserState::Error {
            return Vec::new();
        }
        inner.registry.live_sessions()
    }

    /// The live session for `url`, if one is registered and still exists.
    pub fn session_for_url(&self, url: &str) -> Option<Arc<dyn Session>> {
        let mut inner = self.inner.lock();
        if inner.credentials.state == UserState::Error {
            return None;
        }
        inner.registry.session_for_url(url)
    }

    /// Record the outcome of a successful credential refresh.
    ///
    /// While `Active` the token is replaced in place. While `LoggedOut`
    /// the user transitions back to `Active` and every still-live parked
    /// session is revived. While `Error` the call is absorbed.
    pub fn update_refresh_token(&self, token: impl Into<String>) {
        let token = token.into();
        let to_revive = {
            let mut inner = self.inner.lock();
            match inner.credentials.update_token(token.clone()) {
                TokenTransition::Ignored => return,
                TokenTransition::Replaced => Vec::new(),
                TokenTransition::Reactivated => {
                    tracing::info!(identity = %self.identity, "Reactivated user after token refresh");
                    inner.registry.revive_waiting()
                }
            }
        };
        self.metadata.persist_state(&token);
        // Reviving a session may call back into this user (for example to
        // read the token just stored), so it runs against the private
        // snapshot with the lock released.
        for session in to_revive {
            session.revive_if_needed();
        }
    }

    /// Log the user out, parking its sessions until the next token refresh.
    ///
    /// Ignored for admin users and while `LoggedOut` or `Error`. The
    /// persisted record is marked for removal; the store's owner
    /// reconciles the actual deletion later.
    pub fn log_out(&self) {
        if self.is_admin {
            // Privileged credentials cannot be logged out.
            return;
        }
        {
            let mut inner = self.inner.lock();
            if !inner.credentials.log_out() {
                return;
            }
            // The per-session notification is a passive leaf call and
            // never re-enters this user, so it stays under the lock.
            for session in inner.registry.park_active() {
                session.log_out();
            }
        }
        tracing::info!(identity = %self.identity, "Logged out user");
        self.metadata.persist_removal();
    }

    /// Move the user into the terminal `Error` state.
    ///
    /// All further mutations become no-ops and both session pools read as
    /// empty. Treated as a transient local condition: nothing is persisted.
    pub fn invalidate(&self) {
        self.inner.lock().credentials.invalidate();
        tracing::warn!(identity = %self.identity, "Invalidated user");
    }

    /// Register a session under its configured endpoint URL.
    ///
    /// At most one live session may be registered per endpoint, counting
    /// both the active and the waiting pool. Under `Active` the session
    /// is brought online (admin users bind in-line, others are revived
    /// outside the lock); under `LoggedOut` it is parked; under `Error`
    /// it is silently dropped.
    pub fn register_session(&self, session: Arc<dyn Session>) -> Result<(), RegistrationError> {
        let url = session.configured_url().to_owned();
        let mut inner = self.inner.lock();
        if inner.registry.is_registered(&url) {
            return Err(RegistrationError::DuplicateEndpoint { url });
        }
        match inner.credentials.state {
            UserState::Active => {
                inner.registry.insert_active(url.clone(), &session);
                tracing::debug!(identity = %self.identity, url = %url, "Registered session");
                if self.is_admin {
                    // Leaf call; binding with an admin token never
                    // re-enters this user.
                    session.bind_with_admin_token(&inner.credentials.refresh_token, &url);
                } else {
                    drop(inner);
                    session.revive_if_needed();
                }
            }
            UserState::LoggedOut => {
                inner.registry.insert_waiting(url.clone(), &session);
                tracing::debug!(identity = %self.identity, url = %url, "Parked session for logged-out user");
            }
            // A dead user accepts the registration but stores nothing.
            UserState::Error => {}
        }
        Ok(())
    }
}
