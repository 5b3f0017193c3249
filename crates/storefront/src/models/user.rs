//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tamarind_core::{Email, Role, UserId};

/// A store account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address, the case-insensitive login key.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: Role,
    /// Argon2id password hash. Empty string means the account is not locally
    /// authenticatable (external identity provider).
    pub password_hash: String,
    /// Whether a login requires a one-time email code after the password step.
    pub two_factor_enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The projection of this account that may leave the server.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            two_factor_enabled: self.two_factor_enabled,
        }
    }
}

/// Public projection of a [`User`].
///
/// This is the only user shape serialized into responses; it never carries
/// the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub two_factor_enabled: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_projection_has_no_hash() {
        let user = User {
            id: UserId::new(1),
            email: Email::parse("a@b.com").unwrap(),
            name: "Alice".to_string(),
            role: Role::User,
            password_hash: "$argon2id$...".to_string(),
            two_factor_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["role"], "user");
    }
}
