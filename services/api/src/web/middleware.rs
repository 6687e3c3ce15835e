//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use bookshelf_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::cookies::AUTH_COOKIE;
use crate::web::state::AppState;

/// Middleware that validates the session cookie and resolves the caller.
///
/// If valid, inserts the `Identity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the session token
    let token = jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PortError::Unauthorized("missing session cookie".to_string()))?;

    // 2. Verify it and confirm the account still exists
    let identity = state.users.authenticate(&token).await.map_err(|e| {
        debug!("Rejected session token: {}", e);
        e
    })?;

    // 3. Insert the identity into request extensions and continue
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
