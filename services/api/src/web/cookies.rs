//! services/api/src/web/cookies.rs
//!
//! The `Authorization` session cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::services::tokens::TOKEN_TTL_SECS;

/// Cookie carrying the session token.
pub const AUTH_COOKIE: &str = "Authorization";

/// Builds the session cookie. `secure` should be set in production.
pub fn auth_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(TOKEN_TTL_SECS))
        .build()
}

/// Builds an already-expired session cookie, which makes the browser drop it.
pub fn clear_auth_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}
