// ============================
// webpanel-backend-lib/src/auth/sessions.rs
// ============================
//! Refresh token persistence.
//!
//! Each login appends one session row; a user may hold any number of
//! live sessions at once. Expired rows are evicted lazily, when a
//! lookup trips over them. There is no background sweep.

use std::sync::Arc;
use metrics::counter;
use rusqlite::{params, OptionalExtension};

use crate::db::{now_secs, Database};
use crate::error::AppError;
use crate::metrics::{SESSION_CREATED, SESSION_EVICTED};

#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Database>,
}

impl SessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persist an issued refresh token. Never rotates or overwrites
    /// earlier sessions for the same user.
    pub fn save(&self, user_id: i64, token: &str, expires_at: i64) -> Result<(), AppError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (user_id, refresh_token, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, token, expires_at, now_secs()],
            )
        })?;
        counter!(SESSION_CREATED).increment(1);
        Ok(())
    }

    /// Look up a refresh token.
    ///
    /// Live token: returns the owning user id. Expired token: deletes
    /// the row and returns `None`. Unknown token: returns `None`.
    pub fn verify(&self, token: &str) -> Result<Option<i64>, AppError> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, expires_at FROM sessions WHERE refresh_token = ?1",
                params![token],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
        })?;

        let Some((user_id, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= now_secs() {
            self.db.with_conn(|conn| {
                conn.execute(
                    "DELETE FROM sessions WHERE refresh_token = ?1",
                    params![token],
                )
            })?;
            counter!(SESSION_EVICTED).increment(1);
            tracing::debug!(user_id, "expired session evicted");
            return Ok(None);
        }

        Ok(Some(user_id))
    }

    /// Delete a session row explicitly. Returns whether one existed.
    ///
    /// Not reachable from the HTTP surface; exists for operators and
    /// future logout support.
    pub fn revoke(&self, token: &str) -> Result<bool, AppError> {
        let deleted = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE refresh_token = ?1",
                params![token],
            )
        })?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SessionStore {
        let db = Arc::new(Database::open_in_memory().unwrap());
        // session rows reference users
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash, salt, created_at)
                 VALUES (1, 'alice', 'hash', 'salt', 0)",
                [],
            )
        })
        .unwrap();
        SessionStore::new(db)
    }

    fn row_count(store: &SessionStore) -> i64 {
        store
            .db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            })
            .unwrap()
    }

    #[test]
    fn save_and_verify() {
        let store = test_store();

        store.save(1, "token-a", now_secs() + 3600).unwrap();
        assert_eq!(store.verify("token-a").unwrap(), Some(1));
    }

    #[test]
    fn unknown_token_is_none() {
        let store = test_store();
        assert_eq!(store.verify("missing").unwrap(), None);
    }

    #[test]
    fn expired_token_is_evicted_on_lookup() {
        let store = test_store();

        store.save(1, "stale", now_secs() - 10).unwrap();
        assert_eq!(row_count(&store), 1);

        assert_eq!(store.verify("stale").unwrap(), None);
        assert_eq!(row_count(&store), 0);
    }

    #[test]
    fn concurrent_sessions_for_one_user_coexist() {
        let store = test_store();

        store.save(1, "token-a", now_secs() + 3600).unwrap();
        store.save(1, "token-b", now_secs() + 3600).unwrap();

        assert_eq!(store.verify("token-a").unwrap(), Some(1));
        assert_eq!(store.verify("token-b").unwrap(), Some(1));
        assert_eq!(row_count(&store), 2);
    }

    #[test]
    fn duplicate_token_is_a_store_error() {
        let store = test_store();

        store.save(1, "token-a", now_secs() + 3600).unwrap();
        let result = store.save(1, "token-a", now_secs() + 3600);
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[test]
    fn revoke_deletes_the_row() {
        let store = test_store();

        store.save(1, "token-a", now_secs() + 3600).unwrap();
        assert!(store.revoke("token-a").unwrap());
        assert!(!store.revoke("token-a").unwrap());
        assert_eq!(store.verify("token-a").unwrap(), None);
    }
}
