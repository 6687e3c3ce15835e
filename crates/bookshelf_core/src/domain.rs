//! crates/bookshelf_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format.

use chrono::{DateTime, NaiveDate, Utc};

use crate::ports::{PortError, PortResult};

//=========================================================================================
// Users
//=========================================================================================

/// A registered user, safe to hand to any layer. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// True when a live author profile shares this user's id.
    pub is_author: bool,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: i64,
    pub username: String,
    pub hashed_password: String,
}

/// Everything needed to insert a user row. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub hashed_password: String,
}

/// Partial update of a user. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
    }
}

//=========================================================================================
// Authors
//=========================================================================================

/// An author profile. `user_id` is both the author's id and the owning user's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

/// Partial update of an author profile. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AuthorChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl AuthorChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.birth_date.is_none()
    }
}

//=========================================================================================
// Books
//=========================================================================================

/// A book. Always owned by exactly one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub content: String,
}

/// Partial update of a book. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

//=========================================================================================
// Identity
//=========================================================================================

/// The authenticated caller, derived from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

impl Identity {
    /// Fails with `Forbidden` unless `owner_id` is this identity.
    pub fn ensure_owns(&self, owner_id: i64) -> PortResult<()> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            Err(PortError::Forbidden(format!(
                "user {} does not own this resource",
                self.user_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes_ownership_check() {
        let me = Identity { user_id: 7, username: "reader".into() };
        assert!(me.ensure_owns(7).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let me = Identity { user_id: 7, username: "reader".into() };
        assert!(matches!(me.ensure_owns(8), Err(PortError::Forbidden(_))));
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(BookChanges::default().is_empty());
        assert!(!BookChanges { title: Some("Dune".into()), content: None }.is_empty());
        assert!(AuthorChanges::default().is_empty());
        assert!(UserChanges::default().is_empty());
    }
}
