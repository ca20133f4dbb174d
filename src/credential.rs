//! Password hashing for user records
//!
//! A [`PasswordHash`] can only be produced by hashing a plaintext or by
//! deserializing a stored record, so a stored hash is never hashed twice.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Salted bcrypt hash of `plaintext` at the given work factor
    pub fn hash(plaintext: &str, cost: u32) -> Result<Self, AppError> {
        Ok(Self(bcrypt::hash(plaintext, cost)?))
    }

    pub fn verify(&self, plaintext: &str) -> Result<bool, AppError> {
        Ok(bcrypt::verify(plaintext, &self.0)?)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

pub fn validate_password(plaintext: &str) -> Result<(), AppError> {
    if plaintext.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// [`PasswordHash::hash`] on the blocking pool
pub async fn hash_blocking(plaintext: String, cost: u32) -> Result<PasswordHash, AppError> {
    tokio::task::spawn_blocking(move || PasswordHash::hash(&plaintext, cost)).await?
}

/// [`PasswordHash::verify`] on the blocking pool
pub async fn verify_blocking(hash: PasswordHash, plaintext: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || hash.verify(&plaintext)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn verifies_only_the_original_password() {
        let hash = PasswordHash::hash("correct horse", TEST_COST).unwrap();
        assert!(hash.verify("correct horse").unwrap());
        assert!(!hash.verify("wrong horse").unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = PasswordHash::hash("secret1", TEST_COST).unwrap();
        let b = PasswordHash::hash("secret1", TEST_COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stored_hash_survives_a_serde_round_trip_unchanged() {
        let hash = PasswordHash::hash("secret1", TEST_COST).unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        let restored: PasswordHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, restored);
        assert!(restored.verify("secret1").unwrap());
    }

    #[test]
    fn debug_output_never_shows_the_hash() {
        let hash = PasswordHash::hash("secret1", TEST_COST).unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
