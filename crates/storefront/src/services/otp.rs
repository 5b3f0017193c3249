//! One-time-code authority.
//!
//! Generates, stores and single-use-verifies the 6-digit codes for the
//! second login step. Codes live in a transient, identity-keyed store with a
//! 5-minute expiry; issuing a new code for an email silently invalidates the
//! previous one (last-issued-wins, never accumulation).
//!
//! [`CodeStore`] is the seam: the default [`MemoryCodeStore`] is
//! process-local, which is fine for a single instance. A multi-instance
//! deployment must inject a store backed by a shared TTL-capable key-value
//! service instead.
//!
//! Failed attempts are not rate limited here; that hardening belongs in front
//! of the verify operation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;

use tamarind_core::{Email, UserId};

/// How long an issued code stays valid.
const CODE_TTL_SECS: i64 = 5 * 60;

/// Why a code failed to verify.
///
/// The three cases are surfaced distinctly so the client can choose between
/// retrying the entry and requesting a fresh code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    /// No code on record: never issued, or already consumed.
    #[error("no code on record")]
    NotFound,
    /// The code's 5 minutes have passed. The record is gone; request a new one.
    #[error("code expired")]
    Expired,
    /// A live code exists but does not match the submitted value.
    #[error("code mismatch")]
    Mismatch,
}

/// Store of live one-time codes keyed by destination email.
pub trait CodeStore: Send + Sync {
    /// Generate and store a fresh code for `email`, invalidating any prior
    /// code for the same address. Returns the code for dispatch.
    fn issue(&self, user_id: UserId, email: &Email) -> String;

    /// Check `submitted` against the live code for `email`.
    ///
    /// On success the record is consumed and the bound identity returned. An
    /// expired record is deleted as a side effect of the check (lazy purge);
    /// a mismatch leaves the record in place so the legitimate holder can
    /// retry before expiry.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::NotFound`], [`OtpError::Expired`], or
    /// [`OtpError::Mismatch`].
    fn verify(&self, email: &Email, submitted: &str) -> Result<UserId, OtpError>;
}

struct StoredCode {
    code: String,
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// Process-local, mutex-guarded code store.
#[derive(Default)]
pub struct MemoryCodeStore {
    entries: Mutex<HashMap<String, StoredCode>>,
}

impl MemoryCodeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_at(&self, user_id: UserId, email: &Email, now: DateTime<Utc>) -> String {
        // Uniform over the full 6-digit range.
        let code = rand::rng().random_range(100_000..=999_999).to_string();

        let mut entries = self.lock();
        entries.insert(
            email.as_str().to_owned(),
            StoredCode {
                code: code.clone(),
                user_id,
                expires_at: now + Duration::seconds(CODE_TTL_SECS),
            },
        );

        code
    }

    fn verify_at(
        &self,
        email: &Email,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, OtpError> {
        let mut entries = self.lock();

        let entry = entries.get(email.as_str()).ok_or(OtpError::NotFound)?;

        if now > entry.expires_at {
            entries.remove(email.as_str());
            return Err(OtpError::Expired);
        }

        if entry.code != submitted {
            return Err(OtpError::Mismatch);
        }

        let user_id = entry.user_id;
        entries.remove(email.as_str());
        Ok(user_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredCode>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CodeStore for MemoryCodeStore {
    fn issue(&self, user_id: UserId, email: &Email) -> String {
        self.issue_at(user_id, email, Utc::now())
    }

    fn verify(&self, email: &Email, submitted: &str) -> Result<UserId, OtpError> {
        self.verify_at(email, submitted, Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("a@b.com").unwrap()
    }

    #[test]
    fn test_code_shape() {
        let store = MemoryCodeStore::new();
        for _ in 0..32 {
            let code = store.issue(UserId::new(1), &email());
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn test_verify_consumes_exactly_once() {
        let store = MemoryCodeStore::new();
        let code = store.issue(UserId::new(1), &email());

        assert_eq!(store.verify(&email(), &code), Ok(UserId::new(1)));
        // Consumed: a replay of the same code finds nothing.
        assert_eq!(store.verify(&email(), &code), Err(OtpError::NotFound));
    }

    #[test]
    fn test_never_issued_is_not_found() {
        let store = MemoryCodeStore::new();
        assert_eq!(store.verify(&email(), "123456"), Err(OtpError::NotFound));
    }

    #[test]
    fn test_mismatch_keeps_the_record() {
        let store = MemoryCodeStore::new();
        let code = store.issue(UserId::new(1), &email());
        let wrong = if code == "123456" { "654321" } else { "123456" };

        assert_eq!(store.verify(&email(), wrong), Err(OtpError::Mismatch));
        // The legitimate holder can still succeed.
        assert_eq!(store.verify(&email(), &code), Ok(UserId::new(1)));
    }

    #[test]
    fn test_expired_record_is_purged() {
        let store = MemoryCodeStore::new();
        let issued = Utc::now() - Duration::minutes(6);
        let code = store.issue_at(UserId::new(1), &email(), issued);

        assert_eq!(store.verify(&email(), &code), Err(OtpError::Expired));
        // Purged on the expired check, so a retry is NotFound, not Expired.
        assert_eq!(store.verify(&email(), &code), Err(OtpError::NotFound));
    }

    #[test]
    fn test_reissue_after_expiry_succeeds() {
        let store = MemoryCodeStore::new();
        let issued = Utc::now() - Duration::minutes(6);
        let stale = store.issue_at(UserId::new(1), &email(), issued);
        assert_eq!(store.verify(&email(), &stale), Err(OtpError::Expired));

        let fresh = store.issue(UserId::new(1), &email());
        assert_eq!(store.verify(&email(), &fresh), Ok(UserId::new(1)));
    }

    #[test]
    fn test_last_issued_wins() {
        let store = MemoryCodeStore::new();
        let first = store.issue(UserId::new(1), &email());
        let second = store.issue(UserId::new(1), &email());

        if first != second {
            assert_eq!(store.verify(&email(), &first), Err(OtpError::Mismatch));
        }
        assert_eq!(store.verify(&email(), &second), Ok(UserId::new(1)));
    }

    #[test]
    fn test_codes_are_bound_to_one_email() {
        let store = MemoryCodeStore::new();
        let other = Email::parse("c@d.com").unwrap();
        let code = store.issue(UserId::new(1), &email());

        assert_eq!(store.verify(&other, &code), Err(OtpError::NotFound));
    }
}
