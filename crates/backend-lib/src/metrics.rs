// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const LOGIN_LOCKOUT: &str = "auth.login.lockout";
pub const SESSION_CREATED: &str = "auth.session.created";
pub const SESSION_EVICTED: &str = "auth.session.evicted";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const AUDIT_WRITE_FAILED: &str = "audit.write.failed";
