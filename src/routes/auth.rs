/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation. Handlers only
/// translate between HTTP and the `AuthService`; every decision is made there.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, AuthError, AuthService, LoginCommand, UnauthorizedReason};
use crate::error::{ErrorContext, RequestError, ValidationError};
use crate::routes::users::UserResponse;
use crate::validators::require_field;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCommand {
    type Error = ValidationError;

    fn try_from(request: LoginRequest) -> Result<Self, Self::Error> {
        require_field(&request.email, "email")?;
        require_field(&request.password, "password")?;
        Ok(LoginCommand {
            email: request.email.trim().to_string(),
            password: request.password,
        })
    }
}

/// The user plus both tokens
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 400: Empty email or password
/// - 401: Unknown email or wrong password (indistinguishable)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new("user_login");

    let command = LoginCommand::try_from(form.into_inner()).map_err(|e| context.fail(e))?;
    let outcome = auth.login(command).await.map_err(|e| context.fail(e))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %outcome.user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(&outcome.user),
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Exchanges the refresh token in `Authorization: Bearer <token>` for a new
/// access token. The refresh token itself is not rotated.
///
/// # Errors
/// - 401: Missing, unknown, revoked or expired refresh token
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new("token_refresh");

    let refresh_token = bearer_token(req.headers())
        .ok_or_else(|| context.fail(AuthError::Unauthorized(UnauthorizedReason::MissingBearer)))?;
    let token = auth.refresh(refresh_token).await.map_err(|e| context.fail(e))?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// Revokes the refresh token in the `Authorization` header. Always 204 when a
/// bearer token is present, whether or not it was ever issued.
///
/// # Errors
/// - 400: Missing bearer token
/// - 500: Internal server error
pub async fn revoke(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, RequestError> {
    let context = ErrorContext::new("token_revoke");

    let refresh_token = bearer_token(req.headers()).ok_or_else(|| {
        context.fail(AuthError::BadRequest("missing bearer token".to_string()))
    })?;
    auth.revoke(refresh_token).await.map_err(|e| context.fail(e))?;

    tracing::info!(request_id = %context.request_id, "Refresh token revoked");
    Ok(HttpResponse::NoContent().finish())
}
