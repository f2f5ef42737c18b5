use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppResult;

/// Hash a plaintext password with a per-call random salt.
pub fn hash_password(plain: &str) -> AppResult<String> {
    Ok(hash(plain, DEFAULT_COST)?)
}

/// Check a plaintext password against a stored hash. Returns false on
/// mismatch or malformed hash, never an error.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    verify(plain, hashed).unwrap_or(false)
}
