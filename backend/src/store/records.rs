//! Record store: owns the `userdata` table.

use std::sync::Arc;

use rusqlite::{params, Connection};
use serde_json::Value;

use recordvault_common::Record;

use super::{format_timestamp, timestamp_column, Database};
use crate::error::StoreError;

const CREATE_REQUIRED: &str = "UserId and title required";
const UPDATE_REQUIRED: &str = "Title required";

#[derive(Clone)]
pub struct RecordStore {
    db: Arc<Database>,
}

impl RecordStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a record for `owner_id`. Returns the new record id.
    ///
    /// An `owner_id` of 0 counts as missing; SQLite never assigns it. The
    /// owner is not checked against the users table.
    pub fn create(
        &self,
        owner_id: i64,
        title: &str,
        description: Option<&str>,
        payload: Option<&Value>,
    ) -> Result<i64, StoreError> {
        if owner_id == 0 || title.is_empty() {
            return Err(StoreError::Validation(CREATE_REQUIRED));
        }
        let data = encode_payload(payload)?;

        // Stamp under the connection lock so id order and time order agree.
        let conn = self.db.conn()?;
        let now = format_timestamp(&self.db.now()?);
        conn.execute(
            "INSERT INTO userdata (user_id, title, description, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![owner_id, title, description, data, now],
        )?;
        let id = conn.last_insert_rowid();

        tracing::debug!(record_id = id, owner_id, "Created record");
        Ok(id)
    }

    /// Records owned by `owner_id`, newest first.
    pub fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Record>, StoreError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, description, data, created_at, updated_at
             FROM userdata WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let records = stmt
            .query_map(params![owner_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Overwrite title, description and payload, and bump `updated_at`.
    ///
    /// Absent description or payload are written as NULL. Succeeds whether
    /// or not a record with `id` exists.
    pub fn update(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        payload: Option<&Value>,
    ) -> Result<(), StoreError> {
        if title.is_empty() {
            return Err(StoreError::Validation(UPDATE_REQUIRED));
        }
        let data = encode_payload(payload)?;

        let conn = self.db.conn()?;
        let now = format_timestamp(&self.db.now()?);
        let changed = conn.execute(
            "UPDATE userdata SET title = ?1, description = ?2, data = ?3, updated_at = ?4 \
             WHERE id = ?5",
            params![title, description, data, now, id],
        )?;

        tracing::debug!(record_id = id, changed, "Updated record");
        Ok(())
    }

    /// Remove one record. Absent ids are a no-op.
    pub fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        conn.execute("DELETE FROM userdata WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Remove every record owned by `owner_id`. Returns how many went.
    pub fn delete_by_owner(&self, owner_id: i64) -> Result<usize, StoreError> {
        let conn = self.db.conn()?;
        Ok(delete_owned(&conn, owner_id)?)
    }
}

pub(crate) fn delete_owned(conn: &Connection, owner_id: i64) -> rusqlite::Result<usize> {
    let removed = conn.execute("DELETE FROM userdata WHERE user_id = ?1", params![owner_id])?;
    tracing::debug!(owner_id, removed, "Deleted records by owner");
    Ok(removed)
}

/// JSON `null` and a missing payload are both stored as SQL NULL.
fn encode_payload(payload: Option<&Value>) -> Result<Option<String>, StoreError> {
    match payload {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::to_string(value)
            .map(Some)
            .map_err(|e| StoreError::Storage(format!("payload encoding failed: {}", e))),
    }
}

/// Text that is not valid JSON comes back as a JSON string.
fn decode_payload(raw: Option<String>) -> Option<Value> {
    raw.map(|text| serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        data: decode_payload(row.get(4)?),
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}
