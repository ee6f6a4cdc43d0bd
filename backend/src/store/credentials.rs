//! Credential store: owns the `users` table.
//!
//! Password hashes are written and read here and nowhere else; every value
//! this module returns is a projection without the hash.

use std::sync::Arc;

use rusqlite::{ffi, params, Connection, OptionalExtension};

use recordvault_common::{PublicUser, UserSummary};

use super::password::SecretHasher;
use super::{format_timestamp, timestamp_column, Database};
use crate::error::StoreError;

#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
    hasher: SecretHasher,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, hasher: SecretHasher) -> Self {
        Self { db, hasher }
    }

    /// Create a non-admin account. Returns the new user id.
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<i64, StoreError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(StoreError::Validation("All fields required"));
        }
        self.insert_account(username, email, password, false)
    }

    /// Check a username/password pair.
    ///
    /// An unknown username and a wrong password both yield
    /// [`StoreError::AuthFailure`].
    ///
    /// The password is run through the hasher on both paths, so the time
    /// taken does not reveal whether the account exists.
    pub fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<PublicUser, StoreError> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::Validation("Username and password required"));
        }

        let found = {
            let conn = self.db.conn()?;
            let row = conn.query_row(
                "SELECT id, username, email, is_admin, password FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok((
                        PublicUser {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            email: row.get(2)?,
                            is_admin: row.get(3)?,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            );
            row.optional()?
        };

        let verified = match found {
            Some((user, hash)) => self.hasher.verify(password, &hash).then_some(user),
            None => {
                self.hasher.verify_absent(password);
                None
            }
        };

        verified.ok_or_else(|| {
            tracing::debug!("Login rejected for username {}", username);
            StoreError::AuthFailure
        })
    }

    /// All accounts without the admin flag, oldest id first.
    pub fn list_non_admin(&self) -> Result<Vec<UserSummary>, StoreError> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, email, created_at FROM users WHERE is_admin = 0 ORDER BY id",
        )?;
        let users = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn get_by_id(&self, user_id: i64) -> Result<UserSummary, StoreError> {
        let conn = self.db.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, email, created_at FROM users WHERE id = ?1",
                params![user_id],
                summary_from_row,
            )
            .optional()?;
        user.ok_or(StoreError::NotFound("User"))
    }

    /// Remove the account row only. Absent ids are a no-op.
    ///
    /// Records owned by the user are left behind; use
    /// [`AggregationService::delete_user_cascade`](crate::aggregate::AggregationService::delete_user_cascade)
    /// to remove both.
    pub fn delete_by_id(&self, user_id: i64) -> Result<(), StoreError> {
        let conn = self.db.conn()?;
        delete_account(&conn, user_id)?;
        Ok(())
    }

    /// Create the admin account unless one with `username` already exists.
    /// Returns whether an account was created.
    pub fn seed_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, StoreError> {
        let exists = {
            let conn = self.db.conn()?;
            let row = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1",
                    params![username],
                    |_| Ok(()),
                )
                .optional()?;
            row.is_some()
        };
        if exists {
            return Ok(false);
        }

        match self.insert_account(username, email, password, true) {
            Ok(_) => Ok(true),
            Err(StoreError::Conflict) => {
                tracing::warn!(
                    "Admin seed skipped: email {} already belongs to another account",
                    email
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn insert_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<i64, StoreError> {
        // Hash before taking the lock; it is the slow part.
        let hash = self.hasher.hash(password)?;

        let conn = self.db.conn()?;
        let created_at = format_timestamp(&self.db.now()?);
        conn.execute(
            "INSERT INTO users (username, email, password, is_admin, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, email, hash, is_admin, created_at],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict
            } else {
                StoreError::from(e)
            }
        })?;

        let id = conn.last_insert_rowid();
        tracing::info!(user_id = id, is_admin, "Created account {}", username);
        Ok(id)
    }
}

pub(crate) fn delete_account(conn: &Connection, user_id: i64) -> rusqlite::Result<usize> {
    let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    if removed > 0 {
        tracing::info!(user_id, "Deleted account");
    }
    Ok(removed)
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::store::password::MIN_HASH_ROUNDS;
    use rstest::rstest;

    fn store() -> CredentialStore {
        let db = Arc::new(Database::open(":memory:").unwrap());
        db.ensure_schema().unwrap();
        CredentialStore::new(db, SecretHasher::new(MIN_HASH_ROUNDS))
    }

    #[test]
    fn test_register_then_login() {
        let store = store();
        let id = store.register("alice", "alice@x.com", "pw1").unwrap();
        let user = store.verify_credentials("alice", "pw1").unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
        assert!(!user.is_admin);
    }

    #[test]
    fn test_password_is_stored_hashed() {
        let store = store();
        let id = store.register("alice", "alice@x.com", "pw1").unwrap();
        let stored: String = store
            .db
            .conn()
            .unwrap()
            .query_row("SELECT password FROM users WHERE id = ?1", params![id], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, "pw1");
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let store = store();
        store.register("alice", "alice@x.com", "pw1").unwrap();
        let err = store.register("alice", "other@x.com", "pw2").unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let count: i64 = store
            .db
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM users WHERE username = 'alice'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let store = store();
        store.register("alice", "shared@x.com", "pw1").unwrap();
        let err = store.register("bob", "shared@x.com", "pw2").unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[test]
    fn test_username_is_case_sensitive() {
        let store = store();
        store.register("alice", "a1@x.com", "pw1").unwrap();
        assert!(store.register("Alice", "a2@x.com", "pw1").is_ok());
    }

    #[rstest]
    #[case("", "a@x.com", "pw")]
    #[case("a", "", "pw")]
    #[case("a", "a@x.com", "")]
    fn test_register_requires_all_fields(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
    ) {
        let store = store();
        assert!(matches!(
            store.register(username, email, password),
            Err(StoreError::Validation(_))
        ));
        assert!(store.list_non_admin().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_password_and_unknown_user_fail_alike() {
        let store = store();
        store.register("alice", "alice@x.com", "pw1").unwrap();
        let wrong = store.verify_credentials("alice", "nope").unwrap_err();
        let unknown = store.verify_credentials("mallory", "pw1").unwrap_err();
        assert!(matches!(wrong, StoreError::AuthFailure));
        assert!(matches!(unknown, StoreError::AuthFailure));
        assert_eq!(wrong.public_message(), unknown.public_message());
    }

    #[test]
    fn test_unknown_user_costs_as_much_as_wrong_password() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        db.ensure_schema().unwrap();
        let store = CredentialStore::new(db, SecretHasher::new(20_000));
        store.register("alice", "alice@x.com", "pw1").unwrap();

        let timed = |username: &str| -> Duration {
            let start = Instant::now();
            for _ in 0..3 {
                store.verify_credentials(username, "nope").unwrap_err();
            }
            start.elapsed()
        };
        let wrong = timed("alice");
        let unknown = timed("mallory");

        assert!(
            unknown * 4 >= wrong,
            "unknown user took {:?}, wrong password took {:?}",
            unknown,
            wrong
        );
    }

    #[test]
    fn test_only_unique_violations_conflict() {
        let store = store();
        store.register("alice", "alice@x.com", "pw1").unwrap();
        let conn = store.db.conn().unwrap();
        let insert = "INSERT INTO users (username, email, password, created_at) \
                      VALUES (?1, ?2, 'x', '2024-01-01T00:00:00.000000Z')";

        let duplicate = conn
            .execute(insert, params!["alice", "other@x.com"])
            .unwrap_err();
        assert!(is_unique_violation(&duplicate));

        let missing = conn
            .execute(insert, params![None::<String>, "bob@x.com"])
            .unwrap_err();
        assert!(!is_unique_violation(&missing));
        assert!(matches!(StoreError::from(missing), StoreError::Storage(_)));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let store = store();
        let first = store.register("alice", "alice@x.com", "pw1").unwrap();
        store.delete_by_id(first).unwrap();
        let second = store.register("bob", "bob@x.com", "pw2").unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_seed_admin_is_idempotent() {
        let store = store();
        assert!(store.seed_admin("admin", "admin@x.com", "admin123").unwrap());
        assert!(!store.seed_admin("admin", "admin@x.com", "different").unwrap());

        let admin = store.verify_credentials("admin", "admin123").unwrap();
        assert!(admin.is_admin);
        assert!(store.verify_credentials("admin", "different").is_err());
    }

    #[test]
    fn test_list_non_admin_excludes_admin() {
        let store = store();
        store.seed_admin("admin", "admin@x.com", "admin123").unwrap();
        let alice = store.register("alice", "alice@x.com", "pw1").unwrap();
        let bob = store.register("bob", "bob@x.com", "pw2").unwrap();

        let users = store.list_non_admin().unwrap();
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![alice, bob]);
    }

    #[test]
    fn test_get_by_id_not_found() {
        let store = store();
        assert!(matches!(store.get_by_id(42), Err(StoreError::NotFound("User"))));
    }

    #[test]
    fn test_delete_absent_user_is_noop() {
        let store = store();
        assert!(store.delete_by_id(42).is_ok());
    }
}
