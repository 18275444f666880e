/// Middleware module
///
/// Access token verification for protected routes and file server hit counting.

mod hit_counter;
mod jwt_middleware;

pub use hit_counter::HitCounter;
pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
