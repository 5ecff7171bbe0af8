// ============================
// webpanel-backend-lib/src/auth/guard.rs
// ============================
//! Per-request admission decision.

use std::sync::Arc;
use metrics::counter;

use crate::auth::policy::SecurityPolicy;
use crate::auth::tokens::{TokenClaims, TokenService, TokenType};
use crate::error::AppError;
use crate::metrics::TOKEN_REJECTED;

/// The identity attached to an admitted request. `None` means the
/// request came in anonymously while enforcement was off.
#[derive(Clone)]
pub struct Identity(pub Option<TokenClaims>);

/// Combines the security policy with token verification to decide
/// whether a request may proceed.
#[derive(Clone)]
pub struct AuthGuard {
    policy: SecurityPolicy,
    tokens: Arc<TokenService>,
}

impl AuthGuard {
    pub fn new(policy: SecurityPolicy, tokens: Arc<TokenService>) -> Self {
        Self { policy, tokens }
    }

    /// Admit or reject a request given its bearer token, if any.
    ///
    /// With enforcement off, everything is admitted; a valid access
    /// token still resolves to an identity so audit entries can be
    /// attributed. With enforcement on, a verifying access token is
    /// required.
    pub fn check(&self, bearer: Option<&str>) -> Result<Option<TokenClaims>, AppError> {
        let settings = self.policy.get()?;

        let identity = bearer.and_then(|token| {
            match self.tokens.verify(token, TokenType::Access) {
                Ok(claims) => Some(claims),
                Err(err) => {
                    counter!(TOKEN_REJECTED).increment(1);
                    tracing::debug!(error = %err, "access token rejected");
                    None
                },
            }
        });

        if settings.auth_enabled && identity.is_none() {
            return Err(AppError::Unauthorized);
        }

        Ok(identity)
    }
}
