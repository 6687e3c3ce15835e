//! services/api/src/services/mod.rs
//!
//! Application services: input validation, cache-aside reads, ownership checks
//! and projection of domain rows into response payloads.

pub mod authors;
pub mod books;
pub mod cache;
pub mod password;
pub mod tokens;
pub mod users;

pub use authors::AuthorService;
pub use books::BookService;
pub use tokens::TokenIssuer;
pub use users::UserService;

use bookshelf_core::ports::{PortError, PortResult};

/// Checks that `value` is between `min` and `max` characters long (inclusive).
pub(crate) fn check_length(
    field: &str,
    value: &str,
    min: usize,
    max: Option<usize>,
) -> PortResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(PortError::Validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if let Some(max) = max {
        if len > max {
            return Err(PortError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

pub(crate) fn nothing_to_update() -> PortError {
    PortError::Validation("at least one field must be provided".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_counted_in_chars() {
        assert!(check_length("title", "äöü", 3, Some(3)).is_ok());
        assert!(check_length("title", "ab", 3, None).is_err());
        assert!(check_length("title", "abcd", 3, Some(3)).is_err());
    }
}
