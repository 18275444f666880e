/// Session Store Adapter
///
/// The persistence interface the authentication core consumes. The core never
/// caches what it reads here: every validity decision is a fresh lookup.

mod memory;
mod postgres;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use memory::InMemorySessionStore;
pub use postgres::PgSessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a refresh token at a given instant.
///
/// `Revoked` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Revoked,
    Expired,
}

impl RefreshTokenRecord {
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if now >= self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key (email, refresh token) already exists
    UniqueViolation(String),
    /// The call did not finish within the configured deadline
    Timeout,
    /// The backing store cannot be reached
    Unavailable(String),
    Query(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            StoreError::Timeout => write!(f, "Store call timed out"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Users and refresh tokens as seen by the authentication core
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Mark the token revoked. Absent or already revoked tokens are a no-op.
    async fn revoke_refresh_token(&self, token: &str) -> Result<(), StoreError>;
}

/// Account creation, used by registration only
#[async_trait::async_trait]
pub trait UserRegistry: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
}
