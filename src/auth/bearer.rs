use actix_web::http::header::{HeaderMap, AUTHORIZATION};

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The prefix is case-sensitive. Returns `None` when the header is absent,
/// not valid UTF-8, lacks the prefix or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty())
}
