//! services/api/src/web/routes.rs
//!
//! Builds the complete HTTP router.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::web::authors::{
    create_author_handler, delete_author_handler, get_author_handler, list_authors_handler,
    update_author_handler,
};
use crate::web::books::{
    create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
    update_book_handler,
};
use crate::web::middleware::require_auth;
use crate::web::rest::health_handler;
use crate::web::state::AppState;
use crate::web::users::{
    delete_user_handler, get_user_handler, list_users_handler, login_handler, logout_handler,
    register_handler, update_user_handler,
};

/// Builds the API router: `/api/v1/...` plus `/health`, with CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/users", post(register_handler))
        .route("/users/login", post(login_handler))
        .route("/users/logout", post(logout_handler))
        .route("/authors", get(list_authors_handler))
        .route("/authors/{id}", get(get_author_handler))
        .route("/books", get(list_books_handler))
        .route("/books/{id}", get(get_book_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/users",
            get(list_users_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/users/{id}", get(get_user_handler))
        .route(
            "/authors",
            post(create_author_handler)
                .put(update_author_handler)
                .delete(delete_author_handler),
        )
        .route("/books", post(create_book_handler))
        .route(
            "/books/{id}",
            put(update_book_handler).delete(delete_book_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_v1 = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", api_v1)
        .layer(cors_layer(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e);
            layer
        }
    }
}
