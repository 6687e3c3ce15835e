//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how it is
//! rendered as an HTTP response.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bookshelf_core::ports::PortError;
use tracing::error;

use crate::config::ConfigError;
use crate::web::response::ApiResponse;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Represents a failure while connecting to the cache at startup.
    #[error("Cache Error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(e) => match e {
                PortError::Validation(_) => StatusCode::BAD_REQUEST,
                PortError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                PortError::Forbidden(_) => StatusCode::FORBIDDEN,
                PortError::NotFound(_) => StatusCode::NOT_FOUND,
                PortError::Conflict(_) => StatusCode::CONFLICT,
                PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            _ if status.is_server_error() => {
                error!("Request failed: {}", self);
                "internal server error".to_string()
            }
            ApiError::Port(e) => e.to_string(),
            other => other.to_string(),
        };
        (status, ApiResponse::<()>::failure("error", detail)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Port(PortError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Port(PortError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Port(PortError::Validation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_http_statuses() {
        let cases = [
            (PortError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (PortError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (PortError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (PortError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortError::Conflict("x".into()), StatusCode::CONFLICT),
            (PortError::Unexpected("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn startup_errors_are_internal() {
        let err = ApiError::Internal("boom".into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
