//! services/api/src/web/users.rs
//!
//! Account endpoints: registration, login, logout and self-service management.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use bookshelf_core::domain::Identity;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{
    LoginRequest, PageQuery, PageSchema, RegisterRequest, UpdateUserRequest, UserResponse,
};
use crate::web::cookies::{auth_cookie, clear_auth_cookie};
use crate::web::response::ApiResponse;
use crate::web::state::AppState;

/// POST /users - Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid username or password"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let user = state.users.register(req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success("user created", user),
    ))
}

/// POST /users/login - Exchange credentials for a session cookie
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; sets the Authorization cookie", body = ApiResponse<UserResponse>),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let (token, user) = state.users.login(req).await?;
    let jar = jar.add(auth_cookie(&token, state.config.is_prod));
    Ok((jar, ApiResponse::success("logged in", user)))
}

/// POST /users/logout - Drop the session cookie
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "users",
    responses((status = 204, description = "Session cookie cleared"))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        jar.add(clear_auth_cookie(state.config.is_prod)),
    )
}

/// GET /users - List users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of users", body = ApiResponse<PageSchema<UserResponse>>),
        (status = 400, description = "Malformed pagination parameters"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.users.get_all(&query.to_request()).await?;
    Ok(ApiResponse::success("users retrieved", page))
}

/// GET /users/{id} - Fetch one user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let user = state.users.get_by_id(id).await?;
    Ok(ApiResponse::success("user retrieved", user))
}

/// PUT /users - Update the caller's account
#[utoipa::path(
    put,
    path = "/api/v1/users",
    tag = "users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = ApiResponse<UserResponse>),
        (status = 400, description = "Nothing to update or invalid username"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let user = state.users.update(&identity, req).await?;
    Ok(ApiResponse::success("user updated", user))
}

/// DELETE /users - Delete the caller's account, author profile and books
#[utoipa::path(
    delete,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 204, description = "Account deleted; session cookie cleared"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete(&identity).await?;
    Ok((
        StatusCode::NO_CONTENT,
        jar.add(clear_auth_cookie(state.config.is_prod)),
    ))
}
