/// Authentication Orchestrator
///
/// Login, refresh and revoke composed from the hasher, the token codec, the
/// refresh token generator and the session store. Holds no mutable state:
/// every refresh token decision is a fresh store lookup.
///
/// Refresh does not rotate the refresh token. The same value keeps working
/// until it expires or is revoked, so a leaked token stays usable for its
/// whole lifetime (60 days by default).

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;

use crate::auth::error::{AuthError, UnauthorizedReason};
use crate::auth::jwt::issue_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::AuthSettings;
use crate::store::{RefreshTokenState, SessionStore, StoreError, User};

lazy_static! {
    // Compared against when the email is unknown, so both failures cost one bcrypt check
    static ref UNKNOWN_USER_HASH: String =
        hash_password("unknown-user-placeholder").unwrap_or_default();
}

/// Credentials for `login`, already validated at the transport boundary
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn SessionStore>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(store: Arc<dyn SessionStore>, settings: AuthSettings) -> Self {
        Self { store, settings }
    }

    /// Exchange email and password for an access token and a new refresh token
    ///
    /// Unknown email and wrong password fail identically.
    #[tracing::instrument(name = "auth.login", skip_all)]
    pub async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError> {
        let user = match self
            .bounded(self.store.find_user_by_email(&command.email))
            .await?
        {
            Some(user) => user,
            None => {
                let _ = self
                    .password_matches(command.password, UNKNOWN_USER_HASH.clone())
                    .await;
                return Err(UnauthorizedReason::UnknownEmail.into());
            }
        };

        if !self.password_matches(command.password, user.password_hash.clone()).await? {
            return Err(UnauthorizedReason::WrongPassword.into());
        }

        let access_token = self.access_token_for(user.id)?;

        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.settings.refresh_token_ttl())
            .ok_or_else(|| AuthError::Internal("refresh token expiry out of range".to_string()))?;
        self.bounded(self.store.create_refresh_token(&refresh_token, user.id, expires_at))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Issue a fresh access token for a valid refresh token
    #[tracing::instrument(name = "auth.refresh", skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        if refresh_token.is_empty() {
            return Err(UnauthorizedReason::MissingBearer.into());
        }

        let record = self
            .bounded(self.store.find_refresh_token(refresh_token))
            .await?
            .ok_or(UnauthorizedReason::RefreshTokenNotFound)?;

        match record.state_at(Utc::now()) {
            RefreshTokenState::Active => {}
            RefreshTokenState::Revoked => {
                tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
                return Err(UnauthorizedReason::RefreshTokenRevoked.into());
            }
            RefreshTokenState::Expired => {
                return Err(UnauthorizedReason::RefreshTokenExpired.into());
            }
        }

        let access_token = self.access_token_for(record.user_id)?;

        tracing::info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a refresh token. Succeeds for unknown and already revoked tokens.
    #[tracing::instrument(name = "auth.revoke", skip_all)]
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::BadRequest("missing refresh token".to_string()));
        }

        self.bounded(self.store.revoke_refresh_token(refresh_token))
            .await?;
        Ok(())
    }

    /// Look up the user a verified access token refers to
    pub async fn current_user(&self, user_id: uuid::Uuid) -> Result<User, AuthError> {
        self.bounded(self.store.find_user_by_id(user_id))
            .await?
            .ok_or_else(|| UnauthorizedReason::UnknownSubject.into())
    }

    fn access_token_for(&self, user_id: uuid::Uuid) -> Result<String, AuthError> {
        Ok(issue_access_token(
            user_id,
            &self.settings.secret,
            &self.settings.issuer,
            self.settings.access_token_ttl(),
        )?)
    }

    /// Run a store call under the configured deadline
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.settings.store_timeout(), call)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    /// bcrypt is CPU-bound; keep it off the async workers
    async fn password_matches(&self, candidate: String, hash: String) -> Result<bool, AuthError> {
        let matches = tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))??;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_access_token;
    use crate::auth::password::HASH_COST;
    use crate::store::{InMemorySessionStore, RefreshTokenRecord, UserRegistry};
    use chrono::{DateTime, Duration};
    use std::time::Instant;
    use uuid::Uuid;

    const SECRET: &str = "orchestrator-test-secret";

    async fn setup() -> (AuthService, Arc<InMemorySessionStore>, User) {
        let store = Arc::new(InMemorySessionStore::new());
        let hash = hash_password("secret123").expect("Failed to hash password");
        let user = store.create_user("a@x.com", &hash).await.expect("Failed to create user");
        let service = AuthService::new(store.clone(), AuthSettings::with_secret(SECRET));
        (service, store, user)
    }

    fn credentials(email: &str, password: &str) -> LoginCommand {
        LoginCommand {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Store whose calls never complete
    struct StalledStore;

    #[async_trait::async_trait]
    impl SessionStore for StalledStore {
        async fn find_user_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
            futures::future::pending().await
        }
        async fn find_user_by_id(&self, _: Uuid) -> Result<Option<User>, StoreError> {
            futures::future::pending().await
        }
        async fn create_refresh_token(
            &self,
            _: &str,
            _: Uuid,
            _: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            futures::future::pending().await
        }
        async fn find_refresh_token(&self, _: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
            futures::future::pending().await
        }
        async fn revoke_refresh_token(&self, _: &str) -> Result<(), StoreError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_login_issues_tokens() {
        let (service, store, user) = setup().await;

        let outcome = service.login(credentials("a@x.com", "secret123")).await.unwrap();

        assert_eq!(outcome.user.email, "a@x.com");
        assert_eq!(verify_access_token(&outcome.access_token, SECRET, "chirpy"), Ok(user.id));
        let record = store.find_refresh_token(&outcome.refresh_token).await.unwrap().unwrap();
        assert_eq!(record.user_id, user.id);
        assert!(record.revoked_at.is_none());
        assert!(record.expires_at > Utc::now() + Duration::days(59));
    }

    #[tokio::test]
    async fn test_each_login_creates_a_session() {
        let (service, _, _) = setup().await;

        let first = service.login(credentials("a@x.com", "secret123")).await.unwrap();
        let second = service.login(credentials("a@x.com", "secret123")).await.unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert!(service.refresh(&first.refresh_token).await.is_ok());
        assert!(service.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_fail_alike() {
        let (service, _, _) = setup().await;

        let wrong = service.login(credentials("a@x.com", "wrong-pass")).await.unwrap_err();
        let unknown = service.login(credentials("b@x.com", "secret123")).await.unwrap_err();

        assert_eq!(wrong, AuthError::Unauthorized(UnauthorizedReason::WrongPassword));
        assert_eq!(unknown, AuthError::Unauthorized(UnauthorizedReason::UnknownEmail));
    }

    #[tokio::test]
    async fn test_refresh_returns_token_for_same_user() {
        let (service, _, user) = setup().await;
        let outcome = service.login(credentials("a@x.com", "secret123")).await.unwrap();

        let access_token = service.refresh(&outcome.refresh_token).await.unwrap();

        assert_eq!(verify_access_token(&access_token, SECRET, "chirpy"), Ok(user.id));
    }

    #[tokio::test]
    async fn test_refresh_does_not_rotate() {
        let (service, _, _) = setup().await;
        let outcome = service.login(credentials("a@x.com", "secret123")).await.unwrap();

        service.refresh(&outcome.refresh_token).await.unwrap();
        assert!(service.refresh(&outcome.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let (service, _, _) = setup().await;

        let err = service.refresh("deadbeef").await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized(UnauthorizedReason::RefreshTokenNotFound));
    }

    #[tokio::test]
    async fn test_refresh_empty_token() {
        let (service, _, _) = setup().await;

        let err = service.refresh("").await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized(UnauthorizedReason::MissingBearer));
    }

    #[tokio::test]
    async fn test_refresh_expired_token() {
        let (service, store, user) = setup().await;
        store
            .create_refresh_token("stale", user.id, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        let err = service.refresh("stale").await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized(UnauthorizedReason::RefreshTokenExpired));
    }

    #[tokio::test]
    async fn test_revoke_then_refresh() {
        let (service, _, _) = setup().await;
        let outcome = service.login(credentials("a@x.com", "secret123")).await.unwrap();

        service.revoke(&outcome.refresh_token).await.unwrap();
        let err = service.refresh(&outcome.refresh_token).await.unwrap_err();

        assert_eq!(err, AuthError::Unauthorized(UnauthorizedReason::RefreshTokenRevoked));
        assert!(service.revoke(&outcome.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_succeeds() {
        let (service, _, _) = setup().await;
        assert!(service.revoke("never-issued").await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_empty_token_is_bad_request() {
        let (service, _, _) = setup().await;
        assert!(matches!(service.revoke("").await, Err(AuthError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_collision_is_internal() {
        let (service, store, user) = setup().await;
        let outcome = service.login(credentials("a@x.com", "secret123")).await.unwrap();

        let err = store
            .create_refresh_token(&outcome.refresh_token, user.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(AuthError::from(err), AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_current_user() {
        let (service, _, user) = setup().await;

        assert_eq!(service.current_user(user.id).await.unwrap(), user);
        assert_eq!(
            service.current_user(Uuid::new_v4()).await.unwrap_err(),
            AuthError::Unauthorized(UnauthorizedReason::UnknownSubject)
        );
    }

    #[tokio::test]
    async fn test_stalled_store_times_out() {
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.store_timeout_ms = 20;
        let service = AuthService::new(Arc::new(StalledStore), settings);

        let err = service.refresh("abc").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        let err = service.login(credentials("a@x.com", "secret123")).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_oversized_refresh_ttl_is_internal_error() {
        let (_, store, _) = setup().await;
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.refresh_token_ttl_secs = 1_000_000_000_000_000;
        let service = AuthService::new(store, settings);

        let err = service.login(credentials("a@x.com", "secret123")).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn test_configured_issuer_is_used() {
        let (_, store, user) = setup().await;
        let mut settings = AuthSettings::with_secret(SECRET);
        settings.issuer = "chirpy-staging".to_string();
        let service = AuthService::new(store, settings);

        let outcome = service.login(credentials("a@x.com", "secret123")).await.unwrap();
        assert_eq!(
            verify_access_token(&outcome.access_token, SECRET, "chirpy-staging"),
            Ok(user.id)
        );
    }

    #[test]
    fn test_unknown_user_hash_is_a_real_bcrypt_hash() {
        assert!(UNKNOWN_USER_HASH.starts_with(&format!("$2b${}$", HASH_COST)));
        assert_eq!(verify_password("unknown-user-placeholder", &UNKNOWN_USER_HASH), Ok(true));
    }

    #[tokio::test]
    async fn test_unknown_email_pays_for_a_password_check() {
        let (service, _, _) = setup().await;
        // Build the placeholder hash before timing anything
        lazy_static::initialize(&UNKNOWN_USER_HASH);

        let started = Instant::now();
        service.login(credentials("a@x.com", "wrong-pass")).await.unwrap_err();
        let wrong_password = started.elapsed();

        let started = Instant::now();
        service.login(credentials("b@x.com", "wrong-pass")).await.unwrap_err();
        let unknown_email = started.elapsed();

        assert!(unknown_email * 3 >= wrong_password);
    }
}
