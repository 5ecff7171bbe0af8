// ============================
// webpanel-backend-lib/src/middleware/auth.rs
// ============================
//! Authentication gate middleware.
//!
//! Applied to every route that is protected when enforcement is on.
//! The admission decision itself lives in [`crate::auth::AuthGuard`];
//! this layer just pulls the bearer token out of the request and
//! stashes the resolved identity in the request extensions.

use std::sync::Arc;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::Identity;
use crate::error::AppError;
use crate::AppState;

pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer_token(request.headers());
    let identity = state.guard.check(bearer.as_deref())?;

    request.extensions_mut().insert(Identity(identity));
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}
