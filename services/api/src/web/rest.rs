//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the liveness check.

use axum::response::IntoResponse;
use utoipa::OpenApi;

use crate::models::{
    AuthorResponse, BookResponse, CreateAuthorRequest, CreateBookRequest, LoginRequest,
    RegisterRequest, UpdateAuthorRequest, UpdateBookRequest, UpdateUserRequest, UserResponse,
};
use crate::web::response::ApiResponse;
use crate::web::{authors, books, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        users::register_handler,
        users::login_handler,
        users::logout_handler,
        users::list_users_handler,
        users::get_user_handler,
        users::update_user_handler,
        users::delete_user_handler,
        authors::list_authors_handler,
        authors::get_author_handler,
        authors::create_author_handler,
        authors::update_author_handler,
        authors::delete_author_handler,
        books::list_books_handler,
        books::get_book_handler,
        books::create_book_handler,
        books::update_book_handler,
        books::delete_book_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, UpdateUserRequest, UserResponse,
            CreateAuthorRequest, UpdateAuthorRequest, AuthorResponse,
            CreateBookRequest, UpdateBookRequest, BookResponse,
        )
    ),
    tags(
        (name = "users", description = "Accounts and sessions. Sessions travel in the `Authorization` cookie."),
        (name = "authors", description = "Author profiles, one per user."),
        (name = "books", description = "Books, owned by the author who published them."),
        (name = "health", description = "Liveness check.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> impl IntoResponse {
    ApiResponse::message("ok")
}
