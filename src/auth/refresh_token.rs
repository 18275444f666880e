/// Refresh Token Generator
///
/// Refresh tokens are 32 random bytes from the OS CSPRNG rendered as 64 hex
/// characters: safe as a bearer header value and as a store key.

use rand::rngs::OsRng;
use rand::RngCore;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Length of a generated token in characters
pub const REFRESH_TOKEN_LEN: usize = REFRESH_TOKEN_BYTES * 2;

/// Generate a new cryptographically secure refresh token
///
/// Uniqueness is not checked here; the store's unique key backs it up.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
