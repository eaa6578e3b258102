//! Shared test helpers — available to all `#[cfg(test)]` modules in the crate.

use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::metadata::{ImmediateMetadata, MetadataError, MetadataStore};
use crate::session::Session;
use crate::storage::MetadataDb;
use crate::user::{User, UserConfig};

/// Open a fresh metadata database in a temporary directory.
///
/// Returns both the `MetadataDb` and the `TempDir` guard — the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_db() -> (MetadataDb, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = MetadataDb::open(temp_dir.path()).unwrap();
    (db, temp_dir)
}

/// A `UserConfig` for a regular (non-admin) user holding token `"t0"`.
pub fn test_config(identity: &str) -> UserConfig {
    UserConfig {
        identity: identity.to_string(),
        is_admin: false,
        refresh_token: "t0".to_string(),
        server_url: "https://sync.example.com".to_string(),
    }
}

/// Build a `User` whose metadata updates are discarded.
pub fn make_user(config: UserConfig) -> User {
    User::new(config, Arc::new(ImmediateMetadata::new(Arc::new(NullStore))))
}

/// A metadata store that drops every update.
pub struct NullStore;

impl MetadataStore for NullStore {
    fn set_state(&self, _: &str, _: &str, _: &str) -> Result<(), MetadataError> {
        Ok(())
    }

    fn mark_for_removal(&self, _: &str) -> Result<(), MetadataError> {
        Ok(())
    }
}

/// A metadata store that records every update it receives.
#[derive(Default)]
pub struct RecordingStore {
    /// Identities passed to `mark_for_removal`, in call order.
    pub removals: Mutex<Vec<String>>,
    /// `(identity, server_url, token)` triples passed to `set_state`.
    pub states: Mutex<Vec<(String, String, String)>>,
}

impl MetadataStore for RecordingStore {
    fn set_state(
        &self,
        identity: &str,
        server_url: &str,
        token: &str,
    ) -> Result<(), MetadataError> {
        self.states.lock().push((
            identity.to_owned(),
            server_url.to_owned(),
            token.to_owned(),
        ));
        Ok(())
    }

    fn mark_for_removal(&self, identity: &str) -> Result<(), MetadataError> {
        self.removals.lock().push(identity.to_owned());
        Ok(())
    }
}

/// A scriptable session that counts the calls it receives.
pub struct FakeSession {
    /// `(token, server_url)` pairs passed to `bind_with_admin_token`.
    pub bind_calls: Mutex<Vec<(String, String)>>,
    pub in_error: AtomicBool,
    pub logout_calls: AtomicUsize,
    /// Tokens observed by the revive hook, shared so tests can inspect
    /// them after handing the hook a clone.
    pub observed_tokens: Arc<Mutex<Vec<String>>>,
    /// Optional hook run inside `revive_if_needed`, for re-entrancy tests.
    pub on_revive: Mutex<Option<Box<dyn Fn() + Send>>>,
    pub revive_calls: AtomicUsize,
    pub url: String,
}

impl FakeSession {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            bind_calls: Mutex::new(Vec::new()),
            in_error: AtomicBool::new(false),
            logout_calls: AtomicUsize::new(0),
            observed_tokens: Arc::new(Mutex::new(Vec::new())),
            on_revive: Mutex::new(None),
            revive_calls: AtomicUsize::new(0),
            url: url.to_string(),
        })
    }

    /// Flip the session into its unrecoverable error condition.
    pub fn set_error(&self) {
        self.in_error.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Session for FakeSession {
    fn configured_url(&self) -> &str {
        &self.url
    }

    fn is_in_error_state(&self) -> bool {
        self.in_error.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn log_out(&self) {
        self.logout_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn bind_with_admin_token(&self, token: &str, server_url: &str) {
        self.bind_calls
            .lock()
            .push((token.to_owned(), server_url.to_owned()));
    }

    fn revive_if_needed(&self) {
        self.revive_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(hook) = self.on_revive.lock().as_ref() {
            hook();
        }
    }
}
