//! Unified error handling.
//!
//! Provides a unified `AppError` type that maps service errors to HTTP
//! responses. All route handlers should return `Result<T, AppError>`. Server
//! errors are logged with their full cause chain and answered with a generic
//! body; internal details never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;
use crate::services::otp::OtpError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated (or holds the wrong kind of token).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the required role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::Otp(_) => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidName(_)
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(err) => match err {
                OrderError::EmptyCart
                | OrderError::InvalidQuantity
                | OrderError::TotalMismatch
                | OrderError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderError::ProductNotFound(_) | OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Database(_) => "internal server error".to_string(),
            Self::Auth(err) => match err {
                // Absent account and wrong password read the same.
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "invalid credentials".to_string()
                }
                AuthError::InvalidToken => "invalid or expired token".to_string(),
                AuthError::Otp(code) => match code {
                    OtpError::NotFound => "no verification code on record".to_string(),
                    OtpError::Expired => "verification code expired".to_string(),
                    OtpError::Mismatch => "incorrect verification code".to_string(),
                },
                AuthError::UserAlreadyExists => {
                    "an account with this email already exists".to_string()
                }
                AuthError::InvalidEmail(_) => "invalid email address".to_string(),
                AuthError::InvalidName(msg) | AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "internal server error".to_string()
                }
            },
            Self::Order(err) => match err {
                OrderError::Repository(_) => "internal server error".to_string(),
                other => other.to_string(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_errors_hide_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "users.role held 'superuser'".to_string(),
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "internal server error");
    }

    #[test]
    fn test_missing_user_reads_as_bad_credentials() {
        let err = AppError::Auth(AuthError::UserNotFound);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "invalid credentials");
    }

    #[test]
    fn test_stock_conflict_is_409() {
        let err = AppError::Order(OrderError::InsufficientStock {
            product: "widget".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "insufficient stock for widget");
    }

    #[test]
    fn test_otp_errors_are_distinct_client_messages() {
        let expired = AppError::Auth(AuthError::Otp(OtpError::Expired));
        let mismatch = AppError::Auth(AuthError::Otp(OtpError::Mismatch));
        assert_eq!(expired.status(), StatusCode::BAD_REQUEST);
        assert_ne!(expired.message(), mismatch.message());
    }
}
