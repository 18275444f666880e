mod admin;
mod auth;
mod health_check;
mod users;

pub use admin::{get_metrics, reset_metrics, MetricsResponse};
pub use auth::{login, refresh, revoke, LoginRequest, LoginResponse, RefreshResponse};
pub use health_check::health_check;
pub use users::{current_user, register, RegisterCommand, RegisterRequest, UserResponse};
