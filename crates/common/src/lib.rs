// ================
// crates/common/src/lib.rs
// ================
//! Request and response types
//! shared between the web panel backend and its browser client.
//! Every body on the `/auth` surface is defined here.

use serde::{Deserialize, Serialize};

/// Login request body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh request body
///
/// The refresh token travels in the body, not the `Authorization` header.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body for both user registration and the one-time setup call
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Token pair returned by login and refresh
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Current security policy, as reported by `GET /auth/status`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SecurityStatus {
    pub auth_enabled: bool,
    pub require_webhook_auth: bool,
}

/// Body of `PUT /auth/settings`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SettingsUpdate {
    pub auth_enabled: bool,
    pub require_webhook_auth: bool,
}

/// Response of `PUT /auth/settings`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SettingsResponse {
    pub message: String,
    pub auth_enabled: bool,
    pub require_webhook_auth: bool,
}

/// Response of `POST /auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

/// Response of the one-time `POST /auth/setup` call
///
/// Setup logs the first user straight in, so it carries a token pair
/// alongside the confirmation message.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetupResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_defaults_bearer() {
        let json = r#"{"access_token":"a","refresh_token":"r","expires_in":1800}"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token_type, "Bearer");
        assert_eq!(parsed.expires_in, 1800);
    }

    #[test]
    fn register_request_email_is_optional() {
        let json = r#"{"username":"alice","password":"password123"}"#;
        let parsed: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.username, "alice");
        assert!(parsed.email.is_none());
    }

    #[test]
    fn security_status_round_trips() {
        let status = SecurityStatus {
            auth_enabled: true,
            require_webhook_auth: false,
        };
        let json = serde_json::to_string(&status).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["auth_enabled"], true);
        assert_eq!(parsed["require_webhook_auth"], false);
    }
}
