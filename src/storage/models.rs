use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted user credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Opaque identity the record is keyed by
    pub identity: String,
    /// Soft-delete flag set on logout; the store's owner reconciles the
    /// actual removal later
    pub marked_for_removal: bool,
    /// Most recently known-good refresh token
    pub refresh_token: String,
    /// Server the credential authenticates against
    pub server_url: String,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}
