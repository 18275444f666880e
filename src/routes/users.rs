/// User Routes
///
/// Registration and the current-user lookup behind the access token middleware.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, AuthService};
use crate::error::{AppError, ErrorContext, RequestError, ValidationError};
use crate::middleware::AuthenticatedUser;
use crate::store::{User, UserRegistry};
use crate::validators::{is_valid_email, is_valid_password};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
}

impl TryFrom<RegisterRequest> for RegisterCommand {
    type Error = ValidationError;

    fn try_from(request: RegisterRequest) -> Result<Self, Self::Error> {
        let email = is_valid_email(&request.email)?;
        is_valid_password(&request.password)?;
        Ok(RegisterCommand {
            email,
            password: request.password,
        })
    }
}

/// Public view of a user; never includes the password hash
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or password outside 8..=72 characters
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    registry: web::Data<dyn UserRegistry>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new("user_registration");

    let command = RegisterCommand::try_from(form.into_inner()).map_err(|e| context.fail(e))?;

    let password = command.password;
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| context.fail(AppError::Internal(format!("hashing task failed: {}", e))))?
        .map_err(|e| context.fail(AppError::Internal(e.to_string())))?;

    let user = registry
        .create_user(&command.email, &password_hash)
        .await
        .map_err(|e| context.fail(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// GET /api/users/me
///
/// Requires `Authorization: Bearer <access_token>`.
///
/// # Errors
/// - 401: Missing or invalid token, or the user no longer exists
/// - 500: Internal server error
pub async fn current_user(
    identity: web::ReqData<AuthenticatedUser>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new("current_user").with_user_id(identity.user_id.to_string());

    let user = auth
        .current_user(identity.user_id)
        .await
        .map_err(|e| context.fail(e))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_command_validates_input() {
        let ok = RegisterCommand::try_from(RegisterRequest {
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
        });
        assert!(ok.is_ok());

        let bad_email = RegisterCommand::try_from(RegisterRequest {
            email: "not-an-email".to_string(),
            password: "secret123".to_string(),
        });
        assert!(matches!(bad_email, Err(ValidationError::InvalidFormat("email"))));

        let short_password = RegisterCommand::try_from(RegisterRequest {
            email: "a@x.com".to_string(),
            password: "short".to_string(),
        });
        assert!(matches!(short_password, Err(ValidationError::TooShort("password", _))));
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$2b$10$hash".to_string(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
        assert!(!json.contains("$2b$10$hash"));
        assert!(json.contains("a@x.com"));
    }
}
