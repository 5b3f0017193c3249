//! Bearer token issuing and verification.
//!
//! Two kinds of signed, bounded-lifetime tokens exist:
//!
//! - **pending** tokens (5 minutes) prove that the password step of a
//!   two-factor login succeeded but a one-time code is still owed;
//! - **session** tokens (7 days) are full credentials for authenticated
//!   operations.
//!
//! Validity is entirely a function of the signature and the embedded expiry;
//! there is no server-side session record. Signature validity alone does not
//! imply the intended use: callers must check the kind, which
//! [`TokenService::require_session`] and [`TokenService::require_pending`]
//! do for them.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tamarind_core::{Role, UserId};

use crate::models::user::User;

/// Lifetime of a pending (password-accepted, code-owed) token.
const PENDING_TTL_SECS: i64 = 5 * 60;
/// Lifetime of a full session token.
const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token verification failure.
///
/// Malformed input, a bad signature and an expired token all collapse into
/// one variant: the caller cannot act differently on any of them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
}

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: i32,
    /// Account email at issue time.
    pub email: String,
    /// Account role at issue time.
    pub role: Role,
    /// Kind marker: `true` for pending-2FA tokens, `false` for full sessions.
    pub pending: bool,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// The user this token was issued to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// Issues and verifies bearer tokens with a single HMAC secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::default();
        // Expiry is the contract here; no clock leeway.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Mint a pending-2FA token for a user (5-minute expiry).
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if encoding fails.
    pub fn issue_pending(&self, user: &User) -> Result<String, TokenError> {
        self.issue(user, true, PENDING_TTL_SECS)
    }

    /// Mint a full session token for a user (7-day expiry).
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if encoding fails.
    pub fn issue_session(&self, user: &User) -> Result<String, TokenError> {
        self.issue(user, false, SESSION_TTL_SECS)
    }

    fn issue(&self, user: &User, pending: bool, ttl_secs: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.as_i32(),
            email: user.email.to_string(),
            role: user.role,
            pending,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Invalid)
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for malformed tokens, signature
    /// mismatches, and expiry in the past.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify a token and require that it is a full session token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if verification fails or the token is a
    /// pending-2FA token.
    pub fn require_session(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.pending {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Verify a token and require that it is a pending-2FA token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if verification fails or the token is a
    /// full session token.
    pub fn require_pending(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if !claims.pending {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use secrecy::SecretString;
    use tamarind_core::{Email, Role, UserId};

    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("kX9mP2vQ7rT4wY1zB6nC8dF3gH5jL0aS"))
    }

    fn sample_user() -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("a@b.com").unwrap(),
            name: "Alice".to_string(),
            role: Role::User,
            password_hash: String::new(),
            two_factor_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_roundtrip() {
        let svc = service();
        let token = svc.issue_session(&sample_user()).unwrap();

        let claims = svc.require_session(&token).unwrap();
        assert_eq!(claims.user_id(), UserId::new(7));
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, Role::User);
        assert!(!claims.pending);
    }

    #[test]
    fn test_pending_roundtrip() {
        let svc = service();
        let token = svc.issue_pending(&sample_user()).unwrap();

        let claims = svc.require_pending(&token).unwrap();
        assert!(claims.pending);
    }

    #[test]
    fn test_kind_markers_are_enforced_both_ways() {
        let svc = service();
        let pending = svc.issue_pending(&sample_user()).unwrap();
        let session = svc.issue_session(&sample_user()).unwrap();

        assert_eq!(svc.require_session(&pending), Err(TokenError::Invalid));
        assert_eq!(svc.require_pending(&session), Err(TokenError::Invalid));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let svc = service();
        assert_eq!(svc.verify("not-a-token"), Err(TokenError::Invalid));
        assert_eq!(svc.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().issue_session(&sample_user()).unwrap();
        let other = TokenService::new(&SecretString::from("zZ1xC2vB3nM4aS5dF6gH7jK8lQ9wE0rT"));
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let now = Utc::now();
        let claims = Claims {
            sub: 7,
            email: "a@b.com".to_string(),
            role: Role::User,
            pending: false,
            iat: (now - chrono::Duration::minutes(10)).timestamp(),
            exp: (now - chrono::Duration::minutes(5)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &svc.encoding).unwrap();

        assert_eq!(svc.verify(&token), Err(TokenError::Invalid));
    }
}
