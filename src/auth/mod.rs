/// Authentication module
///
/// Access token issuance/verification, password hashing, refresh token
/// generation, and the orchestrator composing them into login, refresh and
/// revoke.

mod bearer;
mod claims;
mod error;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use bearer::bearer_token;
pub use claims::{Claims, DEFAULT_ISSUER};
pub use error::{AuthError, UnauthorizedReason};
pub use jwt::{issue_access_token, verify_access_token, TokenError};
pub use password::{hash_password, verify_password, HashingError, HASH_COST};
pub use refresh_token::{generate_refresh_token, REFRESH_TOKEN_LEN};
pub use service::{AuthService, LoginCommand, LoginOutcome};
