// ============================
// webpanel-backend-lib/src/auth/audit.rs
// ============================
//! Append-only audit trail.

use std::sync::Arc;
use metrics::counter;
use rusqlite::params;

use crate::db::{now_secs, Database};
use crate::error::AppError;
use crate::metrics::AUDIT_WRITE_FAILED;

/// Records security-relevant actions.
///
/// Writes are best-effort: a failed insert is retried once, then
/// counted and logged. It must never fail or delay the operation
/// being audited, so `record` has no error to return.
#[derive(Clone)]
pub struct AuditLog {
    db: Arc<Database>,
}

impl AuditLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append an audit entry.
    pub fn record(
        &self,
        user_id: Option<i64>,
        action: &str,
        details: Option<&str>,
        ip: Option<&str>,
    ) {
        let mut last_err = None;
        for _ in 0..2 {
            match self.insert(user_id, action, details, ip) {
                Ok(()) => return,
                Err(e) => last_err = Some(e),
            }
        }

        counter!(AUDIT_WRITE_FAILED).increment(1);
        if let Some(err) = last_err {
            tracing::warn!(action, error = %err, "audit write failed, event dropped");
        }
    }

    fn insert(
        &self,
        user_id: Option<i64>,
        action: &str,
        details: Option<&str>,
        ip: Option<&str>,
    ) -> Result<(), AppError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO audit_log (user_id, action, details, ip_address, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, action, details, ip, now_secs()],
            )
        })?;
        Ok(())
    }
}
