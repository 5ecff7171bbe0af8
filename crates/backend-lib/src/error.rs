// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad username or password. Deliberately covers unknown users,
    /// deactivated users, and wrong passwords alike so the response
    /// cannot be used for username enumeration.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Authentication already configured")]
    SetupAlreadyComplete,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::Unauthorized
            | AppError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AppError::UsernameTaken(_)
            | AppError::SetupAlreadyComplete
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "AUTH_001",
            AppError::Unauthorized => "AUTH_002",
            AppError::InvalidRefreshToken => "AUTH_003",
            AppError::AuthRateLimited => "AUTH_004",
            AppError::UsernameTaken(_) => "USER_001",
            AppError::SetupAlreadyComplete => "SETUP_001",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Store(_) => "STORE_001",
            AppError::Io(_) => "IO_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message that never leaks internal detail
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "Invalid username or password".to_string(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::InvalidRefreshToken => "Invalid refresh token".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::UsernameTaken(_) => "Username is already taken".to_string(),
            AppError::SetupAlreadyComplete => {
                "Authentication already configured. Use login endpoint.".to_string()
            },
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::InvalidInput(msg) => format!("Invalid input: {msg}"),
            AppError::Store(_) | AppError::Io(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": self.sanitized_message(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_app_error_display() {
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "Invalid username or password"
        );

        let io_error = AppError::Io(IoError::new(ErrorKind::NotFound, "File not found"));
        assert!(io_error.to_string().contains("IO error"));

        assert_eq!(
            AppError::UsernameTaken("alice".to_string()).to_string(),
            "Username 'alice' is already taken"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::SetupAlreadyComplete.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AuthRateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_error_codes() {
        assert_eq!(AppError::InvalidCredentials.error_code(), "AUTH_001");
        assert_eq!(AppError::Unauthorized.error_code(), "AUTH_002");
        assert_eq!(
            AppError::UsernameTaken("alice".to_string()).error_code(),
            "USER_001"
        );
        assert_eq!(AppError::SetupAlreadyComplete.error_code(), "SETUP_001");
        assert_eq!(AppError::AuthRateLimited.error_code(), "AUTH_004");
    }

    #[test]
    fn credential_errors_share_one_external_shape() {
        // Unknown user and wrong password must be indistinguishable to
        // the caller: same variant, same message, same status.
        let err = AppError::InvalidCredentials;
        assert_eq!(err.sanitized_message(), "Invalid username or password");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_errors_never_leak_detail() {
        let err = AppError::Store(rusqlite::Error::InvalidQuery);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.sanitized_message(),
            "An internal server error occurred"
        );
    }

    #[test]
    fn test_app_error_into_response() {
        let error = AppError::NotFound("Resource not found".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn test_error_from_impls() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "Permission denied");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));

        let app_err: AppError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(app_err, AppError::Store(_)));
    }
}
