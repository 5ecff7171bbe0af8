// ============================
// webpanel-backend-lib/src/auth/policy.rs
// ============================
//! Runtime security policy.
//!
//! A single mutable record decides whether requests must authenticate
//! at all. Reads go straight to the database on every call: the value
//! gates access-control decisions, so a stale cache is worse than the
//! extra lookup.

use std::sync::Arc;
use rusqlite::params;

use crate::auth::tokens::TokenClaims;
use crate::db::{now_secs, Database};
use crate::error::AppError;

/// The singleton policy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecuritySettings {
    pub auth_enabled: bool,
    pub require_webhook_auth: bool,
}

#[derive(Clone)]
pub struct SecurityPolicy {
    db: Arc<Database>,
}

impl SecurityPolicy {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Read the current policy, creating the row with both flags off
    /// if it does not exist yet.
    pub fn get(&self) -> Result<SecuritySettings, AppError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO security_settings
                     (id, auth_enabled, require_webhook_auth, updated_at)
                 VALUES (1, 0, 0, ?1)",
                params![now_secs()],
            )?;
            conn.query_row(
                "SELECT auth_enabled, require_webhook_auth FROM security_settings WHERE id = 1",
                [],
                |row| {
                    Ok(SecuritySettings {
                        auth_enabled: row.get(0)?,
                        require_webhook_auth: row.get(1)?,
                    })
                },
            )
        })
    }

    /// Update the policy.
    ///
    /// Turning enforcement off requires a currently valid principal;
    /// turning it on through this path does not. The caller is
    /// responsible for keeping the no-users state out of here (only
    /// the setup flow may enable auth before the first user exists).
    pub fn set(
        &self,
        auth_enabled: bool,
        require_webhook_auth: bool,
        acting_principal: Option<&TokenClaims>,
    ) -> Result<SecuritySettings, AppError> {
        let current = self.get()?;

        if current.auth_enabled && !auth_enabled && acting_principal.is_none() {
            return Err(AppError::Unauthorized);
        }

        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE security_settings
                 SET auth_enabled = ?1, require_webhook_auth = ?2, updated_at = ?3
                 WHERE id = 1",
                params![auth_enabled, require_webhook_auth, now_secs()],
            )
        })?;

        tracing::info!(auth_enabled, require_webhook_auth, "security settings updated");

        Ok(SecuritySettings {
            auth_enabled,
            require_webhook_auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::TokenType;

    fn test_policy() -> SecurityPolicy {
        SecurityPolicy::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn principal() -> TokenClaims {
        TokenClaims {
            user_id: 1,
            username: "alice".to_string(),
            exp: now_secs() + 600,
            token_type: TokenType::Access,
        }
    }

    #[test]
    fn get_initializes_both_flags_off() {
        let policy = test_policy();
        let settings = policy.get().unwrap();
        assert!(!settings.auth_enabled);
        assert!(!settings.require_webhook_auth);
    }

    #[test]
    fn get_is_idempotent() {
        let policy = test_policy();
        assert_eq!(policy.get().unwrap(), policy.get().unwrap());
    }

    #[test]
    fn exactly_one_row_exists_after_repeated_access() {
        let policy = test_policy();
        policy.get().unwrap();
        policy.set(true, false, None).unwrap();
        policy.get().unwrap();

        let rows: i64 = policy
            .db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM security_settings", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn enabling_needs_no_principal() {
        let policy = test_policy();
        let updated = policy.set(true, true, None).unwrap();
        assert!(updated.auth_enabled);
        assert!(updated.require_webhook_auth);
        assert_eq!(policy.get().unwrap(), updated);
    }

    #[test]
    fn disabling_without_principal_is_unauthorized() {
        let policy = test_policy();
        policy.set(true, false, None).unwrap();

        let result = policy.set(false, false, None);
        assert!(matches!(result, Err(AppError::Unauthorized)));
        // the stored value is untouched
        assert!(policy.get().unwrap().auth_enabled);
    }

    #[test]
    fn disabling_with_principal_succeeds() {
        let policy = test_policy();
        policy.set(true, false, None).unwrap();

        let claims = principal();
        let updated = policy.set(false, false, Some(&claims)).unwrap();
        assert!(!updated.auth_enabled);
        assert_eq!(policy.get().unwrap(), updated);
    }
}
