// ============================
// webpanel-backend-lib/src/auth/credentials.rs
// ============================
//! User credential storage and verification.

use std::sync::Arc;
use rusqlite::{params, OptionalExtension};

use crate::auth::password;
use crate::db::{now_secs, Database};
use crate::error::AppError;

/// A registered user. Hash and salt stay inside the store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

/// Stores users and verifies their passwords.
///
/// Hashing is deliberately slow, so both `create` and `verify` push it
/// onto the blocking thread pool instead of stalling the request path.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new user. Returns the user id, or `UsernameTaken` if
    /// the username already exists (exact, case-sensitive match).
    pub async fn create(
        &self,
        username: &str,
        password: String,
        email: Option<String>,
        is_admin: bool,
    ) -> Result<i64, AppError> {
        validate_username(username)?;
        validate_password(&password)?;

        let salt = password::generate_salt();
        let hash = hash_blocking(password, salt.clone()).await?;
        let now = now_secs();

        let result = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, salt, is_admin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![username, email, hash, salt, is_admin, now],
            )?;
            Ok(conn.last_insert_rowid())
        });

        match result {
            Ok(id) => {
                tracing::info!(user_id = id, username, "user created");
                Ok(id)
            },
            Err(AppError::Store(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(AppError::UsernameTaken(username.to_string()))
            },
            Err(e) => Err(e),
        }
    }

    /// Verify a username + password pair.
    ///
    /// Returns the user on success and updates `last_login`. Unknown
    /// usernames, deactivated users, and wrong passwords all come back
    /// as `None`; callers must not tell them apart in responses.
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, email, password_hash, salt, is_active, is_admin,
                        created_at, last_login
                 FROM users WHERE username = ?1 AND is_active = 1",
                params![username],
                |row| {
                    Ok((
                        User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            email: row.get(2)?,
                            is_active: row.get(5)?,
                            is_admin: row.get(6)?,
                            created_at: row.get(7)?,
                            last_login: row.get(8)?,
                        },
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
        })?;

        let Some((mut user, hash, salt)) = row else {
            // burn a hash so unknown usernames cost as much as wrong passwords
            let candidate = password.to_string();
            let _ = spawn_hash_task(move || {
                let _ = password::hash_password(&candidate, password::DUMMY_SALT);
                true
            })
            .await;
            return Ok(None);
        };

        let candidate = password.to_string();
        let matches =
            spawn_hash_task(move || password::verify_password(&hash, &salt, &candidate)).await?;

        if !matches {
            return Ok(None);
        }

        let now = now_secs();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_login = ?1 WHERE id = ?2",
                params![now, user.id],
            )
        })?;
        user.last_login = Some(now);

        Ok(Some(user))
    }

    /// Replace a user's password with a fresh salt and hash.
    ///
    /// Existing sessions are left untouched; they expire on their own
    /// schedule.
    pub async fn update_password(
        &self,
        user_id: i64,
        new_password: String,
    ) -> Result<(), AppError> {
        validate_password(&new_password)?;

        let salt = password::generate_salt();
        let hash = hash_blocking(new_password, salt.clone()).await?;

        let updated = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1, salt = ?2 WHERE id = ?3",
                params![hash, salt, user_id],
            )
        })?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("user {user_id}")));
        }

        Ok(())
    }

    /// Look up a user by id.
    pub fn get(&self, user_id: i64) -> Result<Option<User>, AppError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, email, is_active, is_admin, created_at, last_login
                 FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        is_active: row.get(3)?,
                        is_admin: row.get(4)?,
                        created_at: row.get(5)?,
                        last_login: row.get(6)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Count registered users. Zero means the bootstrap path is still open.
    pub fn count(&self) -> Result<i64, AppError> {
        self.db
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0)))
    }
}

async fn hash_blocking(mut plain: String, salt: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || password::hash_password_secure(&mut plain, &salt))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(e.to_string()))
}

async fn spawn_hash_task<F>(f: F) -> Result<bool, AppError>
where
    F: FnOnce() -> bool + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::InvalidInput(
            "username must be 3-50 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::InvalidInput(
            "username must be alphanumeric with optional _ or -".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::InvalidInput(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}
