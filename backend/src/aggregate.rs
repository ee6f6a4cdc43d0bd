//! Admin aggregation over the credential and record stores.
//!
//! Nothing here writes on its own: listing joins users with their records,
//! and the cascade delegates to the stores' delete statements.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Deserialize;

use recordvault_common::{Record, UserWithRecords};

use crate::error::StoreError;
use crate::store::{credentials, records, CredentialStore, Database, RecordStore};

/// What a failed per-user record fetch does to [`AggregationService::list_users_with_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Report the user with an empty record list and log a warning. The
    /// failure is not visible to the caller.
    #[default]
    BestEffort,
    /// Fail the whole listing with the first fetch error.
    Strict,
}

#[derive(Clone)]
pub struct AggregationService {
    db: Arc<Database>,
    credentials: CredentialStore,
    records: RecordStore,
    mode: AggregationMode,
}

impl AggregationService {
    pub fn new(
        db: Arc<Database>,
        credentials: CredentialStore,
        records: RecordStore,
        mode: AggregationMode,
    ) -> Self {
        Self {
            db,
            credentials,
            records,
            mode,
        }
    }

    /// Every non-admin user with its records.
    ///
    /// One fetch per user is started at once and all are awaited together.
    /// Results are matched back to users by position, so output order is the
    /// user listing order regardless of which fetch finishes first.
    pub async fn list_users_with_data(&self) -> Result<Vec<UserWithRecords>, StoreError> {
        let users = self.credentials.list_non_admin()?;

        let fetches = users.iter().map(|user| {
            let records = self.records.clone();
            let owner_id = user.id;
            tokio::task::spawn_blocking(move || records.list_by_owner(owner_id))
        });
        let results = join_all(fetches).await;

        users
            .into_iter()
            .zip(results)
            .map(|(user, joined)| -> Result<UserWithRecords, StoreError> {
                let fetched = joined
                    .map_err(|e| StoreError::Storage(format!("record fetch task failed: {}", e)))
                    .and_then(|result| result);
                let data = self.settle(user.id, fetched)?;
                Ok(UserWithRecords { user, data })
            })
            .collect()
    }

    /// Apply the aggregation mode to one user's fetch result.
    fn settle(
        &self,
        user_id: i64,
        fetched: Result<Vec<Record>, StoreError>,
    ) -> Result<Vec<Record>, StoreError> {
        match (fetched, self.mode) {
            (Ok(data), _) => Ok(data),
            (Err(e), AggregationMode::BestEffort) => {
                tracing::warn!(user_id, "Record fetch failed, reporting no records: {}", e);
                Ok(Vec::new())
            }
            (Err(e), AggregationMode::Strict) => Err(e),
        }
    }

    /// One user with its records, newest first.
    pub fn get_user_with_data(&self, user_id: i64) -> Result<UserWithRecords, StoreError> {
        let user = self.credentials.get_by_id(user_id)?;
        let data = self.records.list_by_owner(user_id)?;
        Ok(UserWithRecords { user, data })
    }

    /// Delete the user's records, then the user row, in one transaction.
    ///
    /// [`StoreError::RecordsNotDeleted`] and [`StoreError::UserNotDeleted`]
    /// say which step failed; either way the transaction is rolled back.
    /// Absent users are a no-op.
    pub fn delete_user_cascade(&self, user_id: i64) -> Result<(), StoreError> {
        let removed = self.db.transaction(|tx| {
            let removed = records::delete_owned(tx, user_id)
                .map_err(|e| StoreError::RecordsNotDeleted(e.to_string()))?;
            credentials::delete_account(tx, user_id)
                .map_err(|e| StoreError::UserNotDeleted(e.to_string()))?;
            Ok(removed)
        })?;

        tracing::info!(user_id, records = removed, "Cascade delete finished");
        Ok(())
    }
}
