//! Password digest derivation.
//!
//! Digests are raw Argon2id output over the password and a per-user random
//! salt. Both are stored as bytes next to each other in the user record.

use argon2::Argon2;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Bytes of random salt generated per user.
pub const SALT_LENGTH: usize = 32;

/// Bytes of derived digest.
pub const DIGEST_LENGTH: usize = 32;

/// Generates a fresh salt from the operating system RNG.
///
/// # Errors
///
/// Returns [`AppError::Infrastructure`] if the system RNG is unavailable.
pub fn generate_salt() -> Result<Vec<u8>, AppError> {
    let mut salt = vec![0u8; SALT_LENGTH];
    getrandom::fill(&mut salt).map_err(|e| {
        AppError::infrastructure(
            "Failed to generate random salt",
            json!({ "reason": e.to_string() }),
        )
    })?;
    Ok(salt)
}

/// Derives the digest of `raw_password` under `salt` with Argon2id.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the salt is shorter than Argon2 accepts.
pub fn derive_password(raw_password: &str, salt: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut digest = vec![0u8; DIGEST_LENGTH];
    Argon2::default()
        .hash_password_into(raw_password.as_bytes(), salt, &mut digest)
        .map_err(|e| {
            AppError::bad_request(
                "Password derivation failed",
                json!({ "reason": e.to_string() }),
            )
        })?;
    Ok(digest)
}

/// Returns true if `raw_password` derives to `expected` under `salt`.
///
/// Comparison is constant-time. Derivation failures count as a mismatch.
pub fn verify_password(raw_password: &str, salt: &[u8], expected: &[u8]) -> bool {
    match derive_password(raw_password, salt) {
        Ok(digest) => digest.ct_eq(expected).into(),
        Err(_) => false,
    }
}

/// Serde adapter storing byte vectors as standard base64 strings.
pub mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
