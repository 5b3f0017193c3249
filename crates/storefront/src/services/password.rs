//! Password hashing and verification.
//!
//! Uses Argon2id, a memory-hard adaptive hash sized to resist offline brute
//! force.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Error produced when hashing a password fails.
#[derive(Debug, Error)]
#[error("password hashing error")]
pub struct HashPasswordError;

/// Hash a password using Argon2id with a fresh random salt.
///
/// # Errors
///
/// Returns `HashPasswordError` if the underlying hasher fails.
pub fn hash_password(password: &str) -> Result<String, HashPasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| HashPasswordError)
}

/// Verify a password against a stored hash.
///
/// Returns `false` (never an error) when the stored hash is empty or
/// unparsable: an account without a local hash is simply not locally
/// authenticatable, and the caller must surface that exactly like a wrong
/// password to avoid an enumeration oracle.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if stored_hash.is_empty() {
        return false;
    }

    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_empty_stored_hash_verifies_false() {
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_garbage_stored_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
    }
}
