use std::fmt;

use crate::auth::jwt::TokenError;
use crate::auth::password::HashingError;
use crate::store::StoreError;

/// Why a caller was refused. Logged, never sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    UnknownEmail,
    WrongPassword,
    MissingBearer,
    RefreshTokenNotFound,
    RefreshTokenRevoked,
    RefreshTokenExpired,
    AccessToken(TokenError),
    /// A verified access token names a user that no longer exists
    UnknownSubject,
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnauthorizedReason::UnknownEmail => write!(f, "no user with this email"),
            UnauthorizedReason::WrongPassword => write!(f, "password does not match"),
            UnauthorizedReason::MissingBearer => write!(f, "missing bearer credential"),
            UnauthorizedReason::RefreshTokenNotFound => write!(f, "refresh token not found"),
            UnauthorizedReason::RefreshTokenRevoked => write!(f, "refresh token revoked"),
            UnauthorizedReason::RefreshTokenExpired => write!(f, "refresh token expired"),
            UnauthorizedReason::AccessToken(e) => write!(f, "{}", e),
            UnauthorizedReason::UnknownSubject => write!(f, "token subject does not exist"),
        }
    }
}

/// Errors crossing the authentication core boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Unauthorized(UnauthorizedReason),
    BadRequest(String),
    /// Hashing, signing or store failure; detail is for logs only
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unauthorized(reason) => write!(f, "Unauthorized: {}", reason),
            AuthError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AuthError::Internal(msg) => write!(f, "Internal authentication error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<UnauthorizedReason> for AuthError {
    fn from(reason: UnauthorizedReason) -> Self {
        AuthError::Unauthorized(reason)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<HashingError> for AuthError {
    fn from(err: HashingError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => AuthError::Internal(err.to_string()),
            other => AuthError::Unauthorized(UnauthorizedReason::AccessToken(other)),
        }
    }
}
