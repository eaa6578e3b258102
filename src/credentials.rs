//! Credential state and the login state machine.
//!
//! Pure data plus transition logic — no I/O, no locking. The
//! [`User`](crate::user::User) controller owns a `Credentials` value behind
//! its lock and interprets the returned transition outcomes.

/// Login state of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    /// Holding a credential believed valid; sessions may connect.
    Active,
    /// Logged out; sessions are parked until a new token arrives.
    LoggedOut,
    /// Terminal. The user was invalidated and absorbs further mutations.
    Error,
}

/// Outcome of a refresh-token update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenTransition {
    /// The error state absorbed the update; nothing changed.
    Ignored,
    /// Token replaced in place while active.
    Replaced,
    /// Token replaced and the user transitioned `LoggedOut` -> `Active`;
    /// parked sessions should be revived.
    Reactivated,
}

/// The mutable credential fields guarded by the user's lock.
pub(crate) struct Credentials {
    pub refresh_token: String,
    pub state: UserState,
}

impl Credentials {
    pub fn new(refresh_token: String) -> Self {
        Self {
            refresh_token,
            state: UserState::Active,
        }
    }

    /// Apply a new refresh token.
    pub fn update_token(&mut self, token: String) -> TokenTransition {
        match self.state {
            UserState::Error => TokenTransition::Ignored,
            UserState::Active => {
                self.refresh_token = token;
                TokenTransition::Replaced
            }
            UserState::LoggedOut => {
                self.refresh_token = token;
                self.state = UserState::Active;
                TokenTransition::Reactivated
            }
        }
    }

    /// Transition to `LoggedOut`. Returns whether a transition happened.
    ///
    /// `Error` is terminal and stays untouched.
    pub fn log_out(&mut self) -> bool {
        match self.state {
            UserState::Active => {
                self.state = UserState::LoggedOut;
                true
            }
            UserState::LoggedOut | UserState::Error => false,
        }
    }

    /// Transition to `Error` from any state, irreversibly.
    pub fn invalidate(&mut self) {
        self.state = UserState::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_update_replaces_in_place() {
        let mut credentials = Credentials::new("t0".to_string());
        assert_eq!(
            credentials.update_token("t1".to_string()),
            TokenTransition::Replaced
        );
        assert_eq!(credentials.refresh_token, "t1");
        assert_eq!(credentials.state, UserState::Active);
    }

    #[test]
    fn test_logged_out_update_reactivates() {
        let mut credentials = Credentials::new("t0".to_string());
        assert!(credentials.log_out());
        assert_eq!(credentials.state, UserState::LoggedOut);

        assert_eq!(
            credentials.update_token("t1".to_string()),
            TokenTransition::Reactivated
        );
        assert_eq!(credentials.refresh_token, "t1");
        assert_eq!(credentials.state, UserState::Active);
    }

    #[test]
    fn test_log_out_is_idempotent() {
        let mut credentials = Credentials::new("t0".to_string());
        assert!(credentials.log_out());
        assert!(!credentials.log_out());
        assert_eq!(credentials.state, UserState::LoggedOut);
    }

    #[test]
    fn test_error_absorbs_everything() {
        let mut credentials = Credentials::new("t0".to_string());
        credentials.invalidate();
        assert_eq!(credentials.state, UserState::Error);

        assert_eq!(
            credentials.update_token("t1".to_string()),
            TokenTransition::Ignored
        );
        assert_eq!(credentials.refresh_token, "t0");

        assert!(!credentials.log_out());
        assert_eq!(credentials.state, UserState::Error);
    }

    #[test]
    fn test_invalidate_from_logged_out() {
        let mut credentials = Credentials::new("t0".to_string());
        credentials.log_out();
        credentials.invalidate();
        assert_eq!(credentials.state, UserState::Error);
    }
}
