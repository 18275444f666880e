/// In-process session store
///
/// Mutex-guarded maps with the same contract as the PostgreSQL store.
/// Used by tests and for running the service without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RefreshTokenRecord, SessionStore, StoreError, User, UserRegistry};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

#[derive(Default)]
pub struct InMemorySessionStore {
    tables: Mutex<Tables>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("session store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.refresh_tokens.contains_key(token) {
            return Err(StoreError::UniqueViolation("refresh_tokens.token".to_string()));
        }
        tables.refresh_tokens.insert(
            token.to_string(),
            RefreshTokenRecord {
                token: token.to_string(),
                user_id,
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.lock()?.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if let Some(record) = tables.refresh_tokens.get_mut(token) {
            if record.revoked_at.is_none() {
                record.revoked_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRegistry for InMemorySessionStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation("users.email".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}
