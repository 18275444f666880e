/// Credential Hasher
///
/// bcrypt hashing and verification. Salting is internal, so hashing the same
/// password twice gives different strings.

use std::fmt;

use bcrypt::{hash, verify};

/// Work factor; roughly 100ms per verification on commodity hardware
pub const HASH_COST: u32 = 10;

/// The underlying primitive failed (including an unparseable stored hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashingError(pub String);

impl fmt::Display for HashingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl std::error::Error for HashingError {}

impl From<bcrypt::BcryptError> for HashingError {
    fn from(err: bcrypt::BcryptError) -> Self {
        HashingError(err.to_string())
    }
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, HashingError> {
    Ok(hash(password, HASH_COST)?)
}

/// Verify a password against its hash
///
/// A mismatch is `Ok(false)`, never an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HashingError> {
    Ok(verify(password, hash)?)
}
