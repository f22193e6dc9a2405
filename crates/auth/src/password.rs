//! Password digests.
//!
//! SHA-256 hex digests, matching the stored `password_digest` column.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a password.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a candidate password against a stored digest.
///
/// Comparison runs over the fixed-width digests, not the inputs, so timing
/// does not leak password length.
pub fn verify_password(password: &str, stored_digest: &str) -> bool {
    let candidate = hash_password(password);
    if candidate.len() != stored_digest.len() {
        return false;
    }
    candidate
        .bytes()
        .zip(stored_digest.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
