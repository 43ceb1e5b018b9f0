/// Password Hashing and Verification
///
/// Bcrypt with a random per-hash salt embedded in the output string.
/// Both functions are CPU-heavy by design; async callers should run them on
/// the blocking pool.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// Comparison is constant-time. A malformed hash is treated as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Password verification failed on malformed hash: {}", e);
            false
        }
    }
}
