//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::services::{AuthorService, BookService, TokenIssuer, UserService};
use bookshelf_core::ports::{AuthorRepository, BookRepository, CacheService, UserRepository};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<UserService>,
    pub authors: Arc<AuthorService>,
    pub books: Arc<BookService>,
}

impl AppState {
    /// Wires the services to their ports.
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserRepository>,
        authors: Arc<dyn AuthorRepository>,
        books: Arc<dyn BookRepository>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret);
        Self {
            users: Arc::new(UserService::new(users, cache.clone(), tokens)),
            authors: Arc::new(AuthorService::new(authors.clone(), cache.clone())),
            books: Arc::new(BookService::new(books, authors, cache)),
            config,
        }
    }
}
