//! Authentication service.
//!
//! Covers the full account lifecycle: registration, the password step of
//! login, the optional one-time-code step, and the two-factor preference
//! toggle. Token issuance is delegated to [`TokenService`] and code handling
//! to a [`CodeStore`]; this service owns the policy that ties them together.

mod error;

pub use error::AuthError;

use sqlx::PgPool;

use tamarind_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::User;
use crate::services::otp::CodeStore;
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{Claims, TokenService};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length, to bound hashing work.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Display name bounds (after trimming).
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 100;

/// Result of a successful password check.
///
/// Whether the caller holds a usable session or still owes a one-time code
/// depends on the account's two-factor preference, so login has two distinct
/// success shapes.
pub enum LoginOutcome {
    /// Single-step account: the session token is ready to use.
    Authenticated { token: String, user: User },
    /// Two-factor account: the token only authorizes the code exchange.
    TwoFactorRequired { pending_token: String, user: User },
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
    codes: &'a dyn CodeStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        tokens: &'a TokenService,
        codes: &'a dyn CodeStore,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
            codes,
        }
    }

    /// Register a new account and log it straight in.
    ///
    /// New accounts always get the `user` role and start with two-factor
    /// disabled, so registration ends with a full session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidName` if the name is missing or out of bounds.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<(String, User), AuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name)?;
        validate_password(password)?;

        let password_hash = hash_password(password).map_err(|_| AuthError::PasswordHash)?;

        let user = self
            .users
            .create(&email, name, &password_hash, Role::User)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue_session(&user)?;
        Ok((token, user))
    }

    /// First login step: check the password.
    ///
    /// A malformed email, a missing account, an account with no local
    /// password, and a wrong password are all indistinguishable to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = parse_login_email(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if user.two_factor_enabled {
            let pending_token = self.tokens.issue_pending(&user)?;
            return Ok(LoginOutcome::TwoFactorRequired {
                pending_token,
                user,
            });
        }

        let token = self.tokens.issue_session(&user)?;
        Ok(LoginOutcome::Authenticated { token, user })
    }

    /// Issue a one-time code for a verified pending login.
    ///
    /// `claims` must come from a pending token the caller has already
    /// verified. Re-requesting is allowed; each issue replaces the previous
    /// code. Returns the destination email so the handler can acknowledge
    /// where the code went. Dispatch itself (the email send) happens out of
    /// band.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the claims carry a bad email.
    pub fn send_code(&self, claims: &Claims) -> Result<Email, AuthError> {
        let email = Email::parse(&claims.email)?;

        let code = self.codes.issue(claims.user_id(), &email);

        // Stand-in for the mail dispatch path.
        tracing::debug!(email = %email, code, "one-time code issued");

        Ok(email)
    }

    /// Second login step: exchange a verified pending login plus code for a
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Otp` if the code is absent, expired, or wrong.
    /// Returns `AuthError::UserNotFound` if the account vanished since login.
    pub async fn verify_code(
        &self,
        claims: &Claims,
        code: &str,
    ) -> Result<(String, User), AuthError> {
        let email = Email::parse(&claims.email)?;

        let user_id = self.codes.verify(&email, code)?;

        // Re-read the account rather than trusting five-minute-old claims.
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = self.tokens.issue_session(&user)?;
        Ok((token, user))
    }

    /// Flip the account's two-factor preference.
    ///
    /// Takes effect from the next login; live sessions are untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user does not exist.
    pub async fn set_two_factor(
        &self,
        user_id: tamarind_core::UserId,
        enabled: bool,
    ) -> Result<(), AuthError> {
        self.users
            .set_two_factor(user_id, enabled)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// On the login path a malformed email must read like any other bad
/// credential, so the parse error never reaches the caller. Registration
/// keeps the specific [`AuthError::InvalidEmail`].
fn parse_login_email(raw: &str) -> Result<Email, AuthError> {
    Email::parse(raw).map_err(|_| AuthError::InvalidCredentials)
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.len() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed_then_bounded() {
        assert_eq!(validate_name("  Alice  ").ok(), Some("Alice"));
        assert!(validate_name(" a ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
        assert!(validate_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_login_email_errors_look_like_bad_credentials() {
        assert!(matches!(
            parse_login_email("not-an-email"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            parse_login_email(""),
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(
            parse_login_email("Alice@Example.com").ok().as_ref().map(Email::as_str),
            Some("alice@example.com")
        );
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"p".repeat(128)).is_ok());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }
}
