//! The session-side contract consumed by [`User`](crate::user::User).

/// A network session bound to one endpoint URL and one user.
///
/// Sessions are owned by the surrounding connection layer, never by the
/// user that tracks them — the user holds only weak handles and must
/// tolerate a session being destroyed at any point between accesses.
pub trait Session: Send + Sync {
    /// The endpoint URL this session was configured against.
    ///
    /// Stable for the session's whole lifetime; used as the registry key.
    fn configured_url(&self) -> &str;

    /// Whether the session has hit an unrecoverable error and should be
    /// treated as dead by the registry.
    fn is_in_error_state(&self) -> bool;

    /// Passive notification that the owning user logged out.
    ///
    /// Invoked while the user's lock is held, so implementations must not
    /// call back into the user.
    fn log_out(&self);

    /// Bind immediately using a privileged token.
    ///
    /// Invoked while the user's lock is held, so implementations must not
    /// call back into the user.
    fn bind_with_admin_token(&self, token: &str, server_url: &str);

    /// Bring the session online if it is not already connected.
    ///
    /// Safe to call whether or not revival is actually needed. May call
    /// back into the owning user (for example to re-read the current
    /// refresh token), so the user only ever invokes it after releasing
    /// its lock.
    fn revive_if_needed(&self);
}
