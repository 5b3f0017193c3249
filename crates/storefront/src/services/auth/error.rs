//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::otp::OtpError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tamarind_core::EmailError),

    /// Display name missing or out of bounds.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token missing, malformed, expired, or of the wrong kind.
    #[error("invalid token")]
    InvalidToken,

    /// One-time code rejected.
    #[error("one-time code rejected: {0}")]
    Otp(#[from] OtpError),

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<crate::services::token::TokenError> for AuthError {
    fn from(_: crate::services::token::TokenError) -> Self {
        Self::InvalidToken
    }
}
