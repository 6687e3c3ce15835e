//! services/api/src/web/books.rs

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
use crate::models::{BookResponse, CreateBookRequest, PageQuery, PageSchema, UpdateBookRequest};
use crate::web::response::ApiResponse;
use crate::web::state::AppState;

/// GET /books - List books
#[utoipa::path(
    get,
    path = "/api/v1/books",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = ApiResponse<PageSchema<BookResponse>>),
        (status = 400, description = "Malformed pagination parameters")
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let page = state.books.get_all(&query.to_request()).await?;
    Ok(ApiResponse::success("books retrieved", page))
}

/// GET /books/{id} - Fetch one book
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = ApiResponse<BookResponse>),
        (status = 404, description = "No such book")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let book = state.books.get_by_id(id).await?;
    Ok(ApiResponse::success("book retrieved", book))
}

/// POST /books - Publish a book under the caller's author profile
#[utoipa::path(
    post,
    path = "/api/v1/books",
    tag = "books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = ApiResponse<BookResponse>),
        (status = 400, description = "Invalid title or content"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Caller has no author profile"),
        (status = 409, description = "Title already taken")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let book = state.books.create(&identity, req).await?;
    Ok((StatusCode::CREATED, ApiResponse::success("book created", book)))
}

/// PUT /books/{id} - Update a book the caller owns
#[utoipa::path(
    put,
    path = "/api/v1/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Updated book", body = ApiResponse<BookResponse>),
        (status = 400, description = "Nothing to update or invalid field"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Book belongs to another author"),
        (status = 404, description = "No such book"),
        (status = 409, description = "Title already taken")
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let book = state.books.update(&identity, id, req).await?;
    Ok(ApiResponse::success("book updated", book))
}

/// DELETE /books/{id} - Delete a book the caller owns
#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Book belongs to another author"),
        (status = 404, description = "No such book")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    state.books.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
