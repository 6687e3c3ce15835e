pub mod authors;
pub mod books;
pub mod cookies;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod routes;
pub mod state;
pub mod users;

// Re-export the router builder to make it easily accessible
// to the binary that will build the web server.
pub use middleware::require_auth;
pub use routes::router;
