use chrono::Utc;
use redb::ReadableTable;

use super::db::{DatabaseError, MetadataDb};
use super::models::UserRecord;
use super::tables::*;
use crate::metadata::{MetadataError, MetadataStore};

impl MetadataDb {
    // ========================================================================
    // User record operations
    // ========================================================================

    /// Store a user credential record
    pub fn put_user(&self, record: &UserRecord) -> Result<(), DatabaseError> {
        debug_assert!(
            !record.identity.is_empty(),
            "user identity must not be empty"
        );

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(record)?;
            table.insert(record.identity.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user record by identity
    pub fn get_user(&self, identity: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(identity)? {
            Some(data) => {
                let record: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Delete a user record, returning whether one existed
    pub fn delete_user(&self, identity: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(USERS)?;
            let removed = table.remove(identity)?.is_some();
            removed
        };
        write_txn.commit()?;

        if deleted {
            tracing::debug!(identity = %identity, "Deleted credential record");
        }
        Ok(deleted)
    }

    /// All persisted user records
    pub fn all_users(&self) -> Result<Vec<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut users = Vec::new();
        for entry in table.iter()? {
            let (_, data) = entry?;
            users.push(rmp_serde::from_slice(data.value())?);
        }
        Ok(users)
    }

    /// Records soft-deleted by a logout and awaiting reconciliation
    pub fn users_marked_for_removal(&self) -> Result<Vec<UserRecord>, DatabaseError> {
        let users = self.all_users()?;
        Ok(users.into_iter().filter(|u| u.marked_for_removal).collect())
    }

    /// Remove every record marked for removal (called by the store's owner
    /// when it reconciles credential removal)
    pub fn purge_marked(&self) -> Result<usize, DatabaseError> {
        let write_txn = self.begin_write()?;
        let purged = {
            let mut table = write_txn.open_table(USERS)?;
            let mut marked = Vec::new();
            for entry in table.iter()? {
                let (key, data) = entry?;
                let record: UserRecord = rmp_serde::from_slice(data.value())?;
                if record.marked_for_removal {
                    marked.push(key.value().to_string());
                }
            }
            for identity in &marked {
                table.remove(identity.as_str())?;
            }
            marked.len()
        };
        write_txn.commit()?;

        if purged > 0 {
            tracing::info!(count = purged, "Purged credential records marked for removal");
        }
        Ok(purged)
    }
}

impl MetadataStore for MetadataDb {
    fn set_state(
        &self,
        identity: &str,
        server_url: &str,
        token: &str,
    ) -> Result<(), MetadataError> {
        let now = Utc::now();
        let record = match self.get_user(identity)? {
            Some(mut record) => {
                // A re-login supersedes a pending soft delete.
                record.marked_for_removal = false;
                record.refresh_token = token.to_owned();
                record.server_url = server_url.to_owned();
                record.updated_at = now;
                record
            }
            None => UserRecord {
                identity: identity.to_owned(),
                marked_for_removal: false,
                refresh_token: token.to_owned(),
                server_url: server_url.to_owned(),
                updated_at: now,
            },
        };
        self.put_user(&record)?;
        tracing::debug!(identity = %identity, "Updated persisted credential state");
        Ok(())
    }

    fn mark_for_removal(&self, identity: &str) -> Result<(), MetadataError> {
        if let Some(mut record) = self.get_user(identity)? {
            record.marked_for_removal = true;
            record.updated_at = Utc::now();
            self.put_user(&record)?;
            tracing::debug!(identity = %identity, "Marked persisted credential for removal");
        }
        Ok(())
    }
}
