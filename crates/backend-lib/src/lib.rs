// ============================
// webpanel-backend-lib/src/lib.rs
// ============================
//! Authentication and session backend for the web panel.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    AuditLog, AuthGuard, CredentialStore, LoginRateLimiter, SecurityPolicy, SessionStore,
    TokenService,
};
use crate::config::Settings;
use crate::db::Database;

/// Application state shared across all handlers
pub struct AppState {
    /// User credential storage and verification
    pub credentials: CredentialStore,
    /// Token issuance and verification
    pub tokens: Arc<TokenService>,
    /// Refresh token persistence
    pub sessions: SessionStore,
    /// Runtime security policy
    pub policy: SecurityPolicy,
    /// Audit trail
    pub audit: AuditLog,
    /// Per-request admission decisions
    pub guard: AuthGuard,
    /// Failed-login throttling
    pub login_limiter: LoginRateLimiter,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(db: Arc<Database>, settings: Settings) -> Self {
        let tokens = Arc::new(TokenService::new(
            settings.jwt_secret.as_bytes(),
            settings.access_ttl(),
            settings.refresh_ttl(),
        ));
        let policy = SecurityPolicy::new(db.clone());
        let guard = AuthGuard::new(policy.clone(), tokens.clone());
        let login_limiter = LoginRateLimiter::new(
            settings.login_rate_limit.max_failures,
            Duration::from_secs(settings.login_rate_limit.lockout_secs),
        );

        Self {
            credentials: CredentialStore::new(db.clone()),
            tokens,
            sessions: SessionStore::new(db.clone()),
            policy,
            audit: AuditLog::new(db),
            guard,
            login_limiter,
            settings: Arc::new(settings),
        }
    }
}
