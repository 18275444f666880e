/// Access Token Codec
///
/// Issues and verifies HS256-signed access tokens. Verification is CPU-only:
/// no store lookup happens on this path.

use std::fmt;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The MAC does not match the current secret
    InvalidSignature,
    /// The token cannot be parsed or violates the expected header/claims layout
    Malformed,
    Expired,
    /// The subject is not a user identifier
    InvalidSubject,
    /// Signing failed; a server-side fault, never caused by the caller
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "access token signature is invalid"),
            TokenError::Malformed => write!(f, "access token is malformed"),
            TokenError::Expired => write!(f, "access token has expired"),
            TokenError::InvalidSubject => write!(f, "access token subject is not a user id"),
            TokenError::Signing(msg) => write!(f, "access token signing failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issue an access token for `subject`, expiring `ttl` from now
///
/// # Errors
/// Returns `TokenError::Signing` if the expiry is out of range or the token
/// cannot be encoded
pub fn issue_access_token(
    subject: Uuid,
    secret: &str,
    issuer: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    let claims = Claims::new(subject, issuer, ttl)?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify an access token issued by `issuer` and return its subject
///
/// # Errors
/// - `InvalidSignature` if the token was not signed with `secret`
/// - `Malformed` if the token cannot be parsed or names another issuer
/// - `Expired` if `now >= exp`
/// - `InvalidSubject` if the subject is not a UUID
pub fn verify_access_token(token: &str, secret: &str, issuer: &str) -> Result<Uuid, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;

    // jsonwebtoken still accepts exp == now
    if claims.is_expired() {
        return Err(TokenError::Expired);
    }

    claims.user_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::DEFAULT_ISSUER;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    #[test]
    fn test_issue_and_verify_token() {
        let user_id = Uuid::new_v4();

        let token = issue_access_token(user_id, SECRET, DEFAULT_ISSUER, Duration::hours(1))
            .expect("Failed to issue token");
        let subject = verify_access_token(&token, SECRET, DEFAULT_ISSUER).expect("Failed to verify token");

        assert_eq!(subject, user_id);
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, DEFAULT_ISSUER, Duration::hours(1))
            .expect("Failed to issue token");

        let result = verify_access_token(&token, "some-other-secret", DEFAULT_ISSUER);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, DEFAULT_ISSUER, Duration::hours(-1))
            .expect("Failed to issue token");

        assert_eq!(verify_access_token(&token, SECRET, DEFAULT_ISSUER), Err(TokenError::Expired));
    }

    #[test]
    fn test_zero_ttl_token_is_expired() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, DEFAULT_ISSUER, Duration::zero())
            .expect("Failed to issue token");

        assert_eq!(verify_access_token(&token, SECRET, DEFAULT_ISSUER), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(
            verify_access_token("invalid.token.here", SECRET, DEFAULT_ISSUER),
            Err(TokenError::Malformed)
        );
        assert_eq!(verify_access_token("", SECRET, DEFAULT_ISSUER), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_token() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, DEFAULT_ISSUER, Duration::hours(1))
            .expect("Failed to issue token");

        // Swap the payload for one claiming another subject
        let forged = issue_access_token(Uuid::new_v4(), "attacker-secret", DEFAULT_ISSUER, Duration::hours(1))
            .expect("Failed to issue token");
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        parts[1] = forged_parts[1];
        let tampered = parts.join(".");

        assert_eq!(
            verify_access_token(&tampered, SECRET, DEFAULT_ISSUER),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_non_uuid_subject() {
        let mut claims = Claims::new(Uuid::new_v4(), DEFAULT_ISSUER, Duration::hours(1)).unwrap();
        claims.sub = "not-a-uuid".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode token");

        assert_eq!(verify_access_token(&token, SECRET, DEFAULT_ISSUER), Err(TokenError::InvalidSubject));
    }

    #[test]
    fn test_foreign_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), DEFAULT_ISSUER, Duration::hours(1)).unwrap();
        claims.iss = "someone-else".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode token");

        assert_eq!(verify_access_token(&token, SECRET, DEFAULT_ISSUER), Err(TokenError::Malformed));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), DEFAULT_ISSUER, Duration::hours(1)).unwrap();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode token");

        assert!(verify_access_token(&token, SECRET, DEFAULT_ISSUER).is_err());
    }

    #[test]
    fn test_issuer_must_match_configuration() {
        let user_id = Uuid::new_v4();
        let token = issue_access_token(user_id, SECRET, "chirpy-staging", Duration::hours(1))
            .expect("Failed to issue token");

        assert_eq!(verify_access_token(&token, SECRET, "chirpy-staging"), Ok(user_id));
        assert_eq!(
            verify_access_token(&token, SECRET, DEFAULT_ISSUER),
            Err(TokenError::Malformed)
        );
    }
}
