//! services/api/src/web/authors.rs

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bookshelf_core::domain::Identity;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{
    AuthorResponse, CreateAuthorRequest, PageQuery, PageSchema, UpdateAuthorRequest,
};
use crate::web::response::ApiResponse;
use crate::web::state::AppState;

/// GET /authors - List author profiles
#[utoipa::path(
    get,
    path = "/api/v1/authors",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = ApiResponse<PageSchema<AuthorResponse>>),
        (status = 400, description = "Malformed pagination parameters")
    )
)]
pub async fn list_authors_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.authors.get_all(&query.to_request()).await?;
    Ok(ApiResponse::success("authors retrieved", page))
}

/// GET /authors/{id} - Fetch one author profile by its user id
#[utoipa::path(
    get,
    path = "/api/v1/authors/{id}",
    tag = "authors",
    params(("id" = i64, Path, description = "Author (user) id")),
    responses(
        (status = 200, description = "The author", body = ApiResponse<AuthorResponse>),
        (status = 404, description = "No such author")
    )
)]
pub async fn get_author_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let author = state.authors.get_by_id(id).await?;
    Ok(ApiResponse::success("author retrieved", author))
}

/// POST /authors - Create the caller's author profile
#[utoipa::path(
    post,
    path = "/api/v1/authors",
    tag = "authors",
    request_body = CreateAuthorRequest,
    responses(
        (status = 201, description = "Profile created", body = ApiResponse<AuthorResponse>),
        (status = 400, description = "Invalid names or birth date"),
        (status = 401, description = "Not logged in"),
        (status = 409, description = "Profile already exists")
    )
)]
pub async fn create_author_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateAuthorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let author = state.authors.create(&identity, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success("author created", author),
    ))
}

/// PUT /authors - Update the caller's author profile
#[utoipa::path(
    put,
    path = "/api/v1/authors",
    tag = "authors",
    request_body = UpdateAuthorRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<AuthorResponse>),
        (status = 400, description = "Nothing to update or invalid field"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Caller has no profile")
    )
)]
pub async fn update_author_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<UpdateAuthorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let author = state.authors.update(&identity, req).await?;
    Ok(ApiResponse::success("author updated", author))
}

/// DELETE /authors - Delete the caller's author profile and its books
#[utoipa::path(
    delete,
    path = "/api/v1/authors",
    tag = "authors",
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Caller has no profile")
    )
)]
pub async fn delete_author_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    state.authors.delete(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
