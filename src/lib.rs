//! sync-auth - Client-side authentication and session lifecycle for a sync client
//!
//! This crate tracks a logical user's login state and refresh token, keeps
//! the registry of network sessions bound to that user, and coordinates
//! state transitions (login, logout, invalidation, token refresh) with:
//! - A single exclusive lock around credential and registry state
//! - Weak, endpoint-keyed session handles with lazy garbage collection
//! - Side effects staged under the lock and performed after it is released
//! - Pluggable persisted credential records via [`metadata::MetadataStore`]
//! - A redb-backed default store (ACID, MVCC, crash-safe)
//!
//! The crate performs no network I/O of its own: sessions are owned by the
//! surrounding connection layer and consumed through the [`Session`] trait,
//! and the outcome of credential refreshes is reported in via
//! [`User::update_refresh_token`] / [`User::invalidate`].

pub mod credentials;
pub mod metadata;
mod registry;
pub mod session;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod user;

pub use credentials::UserState;
pub use session::Session;
pub use user::{RegistrationError, User, UserConfig};
