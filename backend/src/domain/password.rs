//! Credential hashing with Argon2id.
//!
//! Hashes are stored as PHC strings so parameters and salts travel with
//! the hash. Verification failures and malformed stored hashes are both
//! reported as a plain mismatch; callers must not distinguish them.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;

/// Failures raised while producing a credential hash.
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Operating-system randomness was unavailable for the salt.
    #[error("failed to obtain salt randomness: {0}")]
    Salt(String),
    /// The hashing primitive rejected its inputs.
    #[error("failed to hash credential: {0}")]
    Hash(String),
}

/// Hash a plaintext credential into a PHC-formatted Argon2id string.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordHashError::Salt(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError::Salt(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Verify a plaintext credential against a stored PHC string.
///
/// Returns `false` for a mismatch *and* for an unparseable stored hash;
/// login must treat both identically to avoid oracle behaviour.
pub fn verify_password(stored_phc: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
