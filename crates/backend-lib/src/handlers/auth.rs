// ============================
// webpanel-backend-lib/src/handlers/auth.rs
// ============================
//! Handlers for the `/auth` surface.

use std::net::IpAddr;
use std::sync::Arc;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use metrics::counter;

use webpanel_common::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, SecurityStatus,
    SettingsResponse, SettingsUpdate, SetupResponse, TokenResponse,
};

use crate::auth::Identity;
use crate::db::now_secs;
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCESS};
use crate::AppState;

/// `POST /auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let ip = client_ip(&headers);
    let ip_str = ip.map(|addr| addr.to_string());

    if let Some(addr) = ip {
        if !state.login_limiter.check(addr) {
            return Err(AppError::AuthRateLimited);
        }
    }

    let Some(user) = state.credentials.verify(&body.username, &body.password).await? else {
        if let Some(addr) = ip {
            state.login_limiter.record_failure(addr);
        }
        counter!(LOGIN_FAILED).increment(1);
        state.audit.record(
            None,
            "login_failed",
            Some(&format!("Username: {}", body.username)),
            ip_str.as_deref(),
        );
        return Err(AppError::InvalidCredentials);
    };

    if let Some(addr) = ip {
        state.login_limiter.record_success(addr);
    }

    let tokens = issue_session(&state, user.id, &user.username)?;
    counter!(LOGIN_SUCCESS).increment(1);
    state
        .audit
        .record(Some(user.id), "login_success", None, ip_str.as_deref());

    Ok(Json(tokens))
}

/// `POST /auth/refresh`
///
/// Trades a live refresh token for a fresh access token. The refresh
/// token itself is not rotated: the same one stays valid until its
/// own expiry.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let Some(user_id) = state.sessions.verify(&body.refresh_token)? else {
        return Err(AppError::InvalidRefreshToken);
    };

    let Some(user) = state.credentials.get(user_id)? else {
        return Err(AppError::InvalidRefreshToken);
    };

    let access_token = state.tokens.issue_access(user.id, &user.username)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: body.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl().as_secs(),
    }))
}

/// `GET /auth/status`
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SecurityStatus>, AppError> {
    let settings = state.policy.get()?;
    Ok(Json(SecurityStatus {
        auth_enabled: settings.auth_enabled,
        require_webhook_auth: settings.require_webhook_auth,
    }))
}

/// `POST /auth/setup`
///
/// One-time bootstrap: creates the first (admin) user, switches
/// enforcement on, and logs the new user straight in. Rejected with a
/// 400 as soon as any user row exists.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<SetupResponse>, AppError> {
    if state.credentials.count()? > 0 {
        return Err(AppError::SetupAlreadyComplete);
    }

    let RegisterRequest {
        username,
        password,
        email,
    } = body;

    let user_id = state.credentials.create(&username, password, email, true).await?;
    state.policy.set(true, false, None)?;

    let tokens = issue_session(&state, user_id, &username)?;

    Ok(Json(SetupResponse {
        message: "Authentication configured successfully".to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}

/// `PUT /auth/settings`
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Extension(Identity(principal)): Extension<Identity>,
    headers: HeaderMap,
    Json(body): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, AppError> {
    let current = state.policy.get()?;

    if current.auth_enabled && !body.auth_enabled && principal.is_none() {
        return Err(AppError::Unauthorized);
    }
    if !current.auth_enabled && body.auth_enabled && state.credentials.count()? == 0 {
        return Err(AppError::InvalidInput(
            "no users exist; complete setup to enable authentication".to_string(),
        ));
    }

    let updated = state
        .policy
        .set(body.auth_enabled, body.require_webhook_auth, principal.as_ref())?;

    if let Some(claims) = &principal {
        state.audit.record(
            Some(claims.user_id),
            "auth_settings_updated",
            Some(&format!(
                "Auth enabled: {}, Webhook auth: {}",
                updated.auth_enabled, updated.require_webhook_auth
            )),
            client_ip(&headers).map(|a| a.to_string()).as_deref(),
        );
    }

    Ok(Json(SettingsResponse {
        message: "Security settings updated".to_string(),
        auth_enabled: updated.auth_enabled,
        require_webhook_auth: updated.require_webhook_auth,
    }))
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(Identity(principal)): Extension<Identity>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let settings = state.policy.get()?;
    if settings.auth_enabled && principal.is_none() {
        return Err(AppError::Unauthorized);
    }

    let RegisterRequest {
        username,
        password,
        email,
    } = body;

    let user_id = state
        .credentials
        .create(&username, password, email, false)
        .await?;

    if let Some(claims) = &principal {
        state.audit.record(
            Some(claims.user_id),
            "user_created",
            Some(&format!("Created user: {username}")),
            client_ip(&headers).map(|a| a.to_string()).as_deref(),
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user_id,
        }),
    ))
}

fn issue_session(
    state: &AppState,
    user_id: i64,
    username: &str,
) -> Result<TokenResponse, AppError> {
    let access_token = state.tokens.issue_access(user_id, username)?;
    let refresh_token = state.tokens.issue_refresh(user_id, username)?;

    let expires_at = now_secs() + state.tokens.refresh_ttl().as_secs() as i64;
    state.sessions.save(user_id, &refresh_token, expires_at)?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl().as_secs(),
    })
}

/// Client address as reported by the reverse proxy.
fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers.get("x-real-ip")?.to_str().ok()?.parse().ok()
}
