//! crates/bookshelf_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database and cache implementations.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{
    Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook, NewUser, User, UserChanges,
    UserCredentials,
};
use crate::pagination::{Page, PageRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by every port and service operation.
/// Adapters translate their library errors into one of these variants exactly once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken by a live user.
    async fn create(&self, user: NewUser) -> PortResult<User>;

    async fn get_by_id(&self, id: i64) -> PortResult<User>;

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    /// True when a live (not soft-deleted) user has this id.
    async fn exists(&self, id: i64) -> PortResult<bool>;

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<User>>;

    async fn update(&self, id: i64, changes: UserChanges) -> PortResult<User>;

    /// Soft-deletes the user together with their author profile and books.
    async fn delete(&self, id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Creates the author profile for `user_id`. Fails with `Conflict` if one exists.
    async fn create(&self, user_id: i64, author: NewAuthor) -> PortResult<Author>;

    async fn get_by_id(&self, user_id: i64) -> PortResult<Author>;

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<Author>>;

    async fn update(&self, user_id: i64, changes: AuthorChanges) -> PortResult<Author>;

    /// Soft-deletes the author profile together with its books.
    async fn delete(&self, user_id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Fails with `Conflict` when the title is already used by a live book.
    async fn create(&self, author_id: i64, book: NewBook) -> PortResult<Book>;

    async fn get_by_id(&self, id: i64) -> PortResult<Book>;

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<Book>>;

    async fn update(&self, id: i64, changes: BookChanges) -> PortResult<Book>;

    async fn delete(&self, id: i64) -> PortResult<()>;
}

//=========================================================================================
// Cache Port (Trait)
//=========================================================================================

#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns `Ok(None)` on a miss.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Stores `value` under `key`; the entry expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()>;
}
