// ============================
// webpanel-backend-lib/src/auth/tokens.rs
// ============================
//! Signed token issuance and verification.
//!
//! Tokens are HS256 JWTs. The signing key comes from configuration and
//! lives for the whole process; access and refresh tokens share it and
//! are told apart by the `type` claim.

use std::fmt;
use std::time::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Discriminates access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    pub username: String,
    /// Absolute expiry, seconds since epoch
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// Why a token was rejected. Callers map every variant to a single
/// unauthorized response; the distinction exists for logs only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("expected a {expected} token, got a {actual} token")]
    WrongType {
        expected: TokenType,
        actual: TokenType,
    },
    #[error("malformed token")]
    Malformed,
}

/// Issues and verifies signed tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a short-lived access token
    pub fn issue_access(&self, user_id: i64, username: &str) -> Result<String, AppError> {
        self.issue(user_id, username, TokenType::Access, self.access_ttl)
    }

    /// Issue a long-lived refresh token
    pub fn issue_refresh(&self, user_id: i64, username: &str) -> Result<String, AppError> {
        self.issue(user_id, username, TokenType::Refresh, self.refresh_ttl)
    }

    fn issue(
        &self,
        user_id: i64,
        username: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            exp: crate::db::now_secs() + ttl.as_secs() as i64,
            token_type,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
    }

    /// Verify signature, expiry, and token type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // no leeway: a token past its exp must never verify
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(map_jwt_error)?;

        let claims = data.claims;
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

/// Maps jsonwebtoken errors to our TokenError type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough";

    fn service() -> TokenService {
        TokenService::new(
            SECRET,
            Duration::from_secs(1800),
            Duration::from_secs(7 * 24 * 3600),
        )
    }

    fn sign_claims(claims: &TokenClaims, secret: &[u8]) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("failed to create test token")
    }

    #[test]
    fn access_token_round_trips_claims() {
        let svc = service();
        let token = svc.issue_access(7, "alice").unwrap();

        let claims = svc.verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > crate::db::now_secs());
    }

    #[test]
    fn refresh_presented_as_access_is_wrong_type() {
        let svc = service();
        let refresh = svc.issue_refresh(7, "alice").unwrap();

        let result = svc.verify(&refresh, TokenType::Access);
        assert_eq!(
            result,
            Err(TokenError::WrongType {
                expected: TokenType::Access,
                actual: TokenType::Refresh,
            })
        );
    }

    #[test]
    fn access_presented_as_refresh_is_wrong_type() {
        let svc = service();
        let access = svc.issue_access(7, "alice").unwrap();

        assert!(matches!(
            svc.verify(&access, TokenType::Refresh),
            Err(TokenError::WrongType { .. })
        ));
    }

    #[test]
    fn expired_token_never_verifies() {
        let svc = service();
        let claims = TokenClaims {
            user_id: 7,
            username: "alice".to_string(),
            exp: crate::db::now_secs() - 10,
            token_type: TokenType::Access,
        };
        let token = sign_claims(&claims, SECRET);

        assert_eq!(svc.verify(&token, TokenType::Access), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let svc = service();
        let claims = TokenClaims {
            user_id: 7,
            username: "alice".to_string(),
            exp: crate::db::now_secs() + 600,
            token_type: TokenType::Access,
        };
        let token = sign_claims(&claims, b"wrong-secret-key-that-is-different");

        assert_eq!(
            svc.verify(&token, TokenType::Access),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let svc = service();
        assert_eq!(
            svc.verify("not-a-valid-jwt", TokenType::Access),
            Err(TokenError::Malformed)
        );
        assert_eq!(svc.verify("", TokenType::Access), Err(TokenError::Malformed));
    }

    #[test]
    fn type_claim_serializes_lowercase() {
        let claims = TokenClaims {
            user_id: 1,
            username: "bob".to_string(),
            exp: 0,
            token_type: TokenType::Refresh,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
        assert_eq!(json["user_id"], 1);
    }
}
