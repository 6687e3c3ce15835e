//! services/api/src/models.rs
//!
//! Request and response payloads of the HTTP API. Responses are projections of
//! the domain types and never carry credentials.

use bookshelf_core::domain::{Author, Book, User};
use bookshelf_core::pagination::PageRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAuthorRequest {
    pub first_name: String,
    pub last_name: String,
    /// ISO 8601 date, e.g. `1929-10-21`.
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateAuthorRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Pagination query string: `?l=<limit>&p=<page>&s=<sort>`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Rows per page. Missing or zero means 10.
    pub l: Option<u32>,
    /// 1-based page number. Missing or zero means 1.
    pub p: Option<u32>,
    /// Sort as `<column> [asc|desc]`. Unknown columns fall back to `id desc`.
    pub s: Option<String>,
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(
            self.l.unwrap_or(0),
            self.p.unwrap_or(0),
            self.s.clone().unwrap_or_default(),
        )
    }
}

/// Treats a blank optional field as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub is_author: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_author: user.is_author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthorResponse {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            user_id: author.user_id,
            first_name: author.first_name,
            last_name: author.last_name,
            birth_date: author.birth_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            content: book.content,
            author_id: book.author_id,
        }
    }
}

/// Documentation shape of a paged listing; the wire type is `Page<T>`.
#[derive(Serialize, ToSchema)]
pub struct PageSchema<T> {
    pub limit: u32,
    pub page: u32,
    pub sort: String,
    pub total_rows: u64,
    pub total_pages: u64,
    pub rows: Vec<T>,
}
