/// Access token claims
///
/// The payload of an access token: subject, issue time, expiry and issuer
/// (RFC 7519 registered claims only).

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::TokenError;

/// Issuer used when the configuration names none
pub const DEFAULT_ISSUER: &str = "chirpy";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    /// Claims for `user_id` issued by `issuer`, valid from now for `ttl`.
    ///
    /// A negative `ttl` yields claims that are already expired.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the expiry does not fit a timestamp
    pub fn new(user_id: Uuid, issuer: &str, ttl: Duration) -> Result<Self, TokenError> {
        let now = Utc::now().timestamp();
        let exp = now
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        Ok(Self {
            sub: user_id.to_string(),
            exp,
            iat: now,
            iss: issuer.to_string(),
        })
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSubject)
    }

    /// Expired once `now >= exp`
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
