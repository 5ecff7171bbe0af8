// ============================
// webpanel-backend-lib/src/router.rs
// ============================
//! HTTP router for the auth surface.
use std::sync::Arc;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::auth as handlers;
use crate::middleware::auth::auth_gate;
use crate::AppState;

/// Build the application router.
///
/// Login, refresh, status, and setup are always reachable; settings
/// and registration sit behind the auth gate, which enforces tokens
/// only while the policy says so.
pub fn create_router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/auth/settings", put(handlers::update_settings))
        .route("/auth/register", post(handlers::register))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_gate));

    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/status", get(handlers::status))
        .route("/auth/setup", post(handlers::setup))
        .merge(gated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
