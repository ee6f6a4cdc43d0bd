//! SQLite persistence: the shared database handle and the two stores on top of it.

pub mod credentials;
pub mod password;
pub mod records;

pub use credentials::CredentialStore;
pub use password::SecretHasher;
pub use records::RecordStore;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, Transaction};

use crate::error::StoreError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS userdata (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        data TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE INDEX IF NOT EXISTS idx_userdata_user_id ON userdata(user_id);
";

/// Shared handle to the SQLite database.
///
/// Opened once at startup and passed to every store. Statements run one at a
/// time under the connection lock.
pub struct Database {
    conn: Mutex<Connection>,
    /// Last timestamp handed out by [`Database::now`].
    clock: Mutex<DateTime<Utc>>,
}

impl Database {
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| StoreError::Storage(e.to_string()))?;
                }
            }
        }

        let conn = Connection::open(path)?;

        // The userdata -> users reference is declared but not enforced.
        conn.pragma_update(None, "foreign_keys", false)?;

        tracing::info!("Opened database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
        })
    }

    /// Create tables and indexes. Safe to run on every boot.
    ///
    /// Also moves the clock past the newest stored timestamp, so rows written
    /// after a restart still sort after existing ones if the wall clock went
    /// backwards.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;

        let newest: Option<String> = conn.query_row(
            "SELECT MAX(ts) FROM (
                SELECT MAX(created_at) AS ts FROM users
                UNION ALL SELECT MAX(created_at) FROM userdata
                UNION ALL SELECT MAX(updated_at) FROM userdata
            )",
            [],
            |row| row.get(0),
        )?;
        if let Some(raw) = newest {
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => {
                    let mut last = self
                        .clock
                        .lock()
                        .map_err(|e| StoreError::Storage(e.to_string()))?;
                    *last = (*last).max(ts.with_timezone(&Utc));
                }
                Err(e) => tracing::warn!("Ignoring unparseable stored timestamp {}: {}", raw, e),
            }
        }

        tracing::debug!("Schema ready");
        Ok(())
    }

    /// Cheap liveness probe.
    pub fn ping(&self) -> Result<(), StoreError> {
        self.conn()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    /// Run `f` inside one transaction. Any error rolls everything back.
    pub(crate) fn transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Current time at microsecond precision, strictly later than any
    /// timestamp previously returned by this handle.
    pub(crate) fn now(&self) -> Result<DateTime<Utc>, StoreError> {
        let mut last = self
            .clock
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let mut now = Utc::now().trunc_subsecs(6);
        if now <= *last {
            now = *last + Duration::microseconds(1);
        }
        *last = now;
        Ok(now)
    }
}

/// Fixed-width RFC 3339 form, so text order matches time order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Read a timestamp column written by [`format_timestamp`].
pub(crate) fn timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let db = Database::open(":memory:").unwrap();
        db.ensure_schema().unwrap();
        db.ensure_schema().unwrap();
        db.ping().unwrap();
    }

    #[test]
    fn test_clock_is_strictly_increasing() {
        let db = Database::open(":memory:").unwrap();
        let mut previous = db.now().unwrap();
        for _ in 0..1000 {
            let next = db.now().unwrap();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_clock_resumes_after_newest_stored_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("database.db").display());
        let future = "2999-01-01T00:00:00.000000Z";

        {
            let db = Database::open(&url).unwrap();
            db.ensure_schema().unwrap();
            db.conn()
                .unwrap()
                .execute(
                    "INSERT INTO userdata (user_id, title, created_at, updated_at) \
                     VALUES (1, 'later', ?1, ?1)",
                    [future],
                )
                .unwrap();
        }

        let db = Database::open(&url).unwrap();
        db.ensure_schema().unwrap();
        assert!(format_timestamp(&db.now().unwrap()).as_str() > future);
    }

    #[test]
    fn test_formatted_timestamps_sort_like_times() {
        let db = Database::open(":memory:").unwrap();
        let a = db.now().unwrap();
        let b = db.now().unwrap();
        let (fa, fb) = (format_timestamp(&a), format_timestamp(&b));
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert!(fa.ends_with('Z'));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/database.db");
        let url = format!("sqlite:{}", path.display());
        let db = Database::open(&url).unwrap();
        db.ensure_schema().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_not_enforced() {
        let db = Database::open(":memory:").unwrap();
        db.ensure_schema().unwrap();
        let now = format_timestamp(&db.now().unwrap());
        let inserted = db
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO userdata (user_id, title, created_at, updated_at) \
                 VALUES (999, 'orphan', ?1, ?1)",
                [&now],
            )
            .unwrap();
        assert_eq!(inserted, 1);
    }
}
