//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `UserRepository`, `AuthorRepository` and `BookRepository` ports from the `core`
//! crate. It handles all interactions with the PostgreSQL database using `sqlx`.
//!
//! Rows are never physically removed: deletes stamp `deleted_at`, and every read
//! filters on `deleted_at IS NULL`.

use async_trait::async_trait;
use bookshelf_core::domain::{
    Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook, NewUser, User, UserChanges,
    UserCredentials,
};
use bookshelf_core::pagination::{Page, PageRequest};
use bookshelf_core::ports::{
    AuthorRepository, BookRepository, PortError, PortResult, UserRepository,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Translates a sqlx error into the port taxonomy. `what` names the missing row.
fn map_db_error(e: sqlx::Error, what: impl Into<String>) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what.into()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => PortError::Conflict(db.message().to_string()),
            Some(FOREIGN_KEY_VIOLATION) => PortError::NotFound(what.into()),
            _ => PortError::Unexpected(db.message().to_string()),
        },
        other => PortError::Unexpected(other.to_string()),
    }
}

/// Maps a sort string such as `"title asc"` onto a whitelisted `ORDER BY` clause.
/// Anything not on the whitelist falls back to newest-first by id.
fn order_clause(sort: &str, allowed: &[&str], prefix: &str) -> String {
    let mut parts = sort.split_whitespace();
    let column = parts.next().unwrap_or("id");
    let direction = match parts.next() {
        Some("asc") | None => "ASC",
        Some("desc") => "DESC",
        Some(_) => return format!("{prefix}id DESC"),
    };
    if parts.next().is_some() || !allowed.contains(&column) {
        return format!("{prefix}id DESC");
    }
    format!("{prefix}{column} {direction}")
}

fn to_limit_offset(request: &PageRequest) -> (i64, i64) {
    (
        i64::from(request.limit()),
        i64::try_from(request.offset()).unwrap_or(i64::MAX),
    )
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    is_author: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            is_author: self.is_author,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: i64,
    username: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            username: self.username,
            hashed_password: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct AuthorRecord {
    user_id: i64,
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    created_at: DateTime<Utc>,
}
impl AuthorRecord {
    fn to_domain(self) -> Author {
        Author {
            user_id: self.user_id,
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    created_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

const USER_COLUMNS: &str = "u.id, u.username, u.created_at, \
     EXISTS (SELECT 1 FROM authors a WHERE a.user_id = u.id AND a.deleted_at IS NULL) AS is_author";

const USER_SORT_COLUMNS: &[&str] = &["id", "username", "created_at"];

#[async_trait]
impl UserRepository for DbAdapter {
    async fn create(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, created_at, FALSE AS is_author",
        )
        .bind(&user.username)
        .bind(&user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, format!("User {} not found", user.username)))?;
        Ok(record.to_domain())
    }

    async fn get_by_id(&self, id: i64) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1 AND u.deleted_at IS NULL");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, format!("User {} not found", id)))?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, password_hash FROM users \
             WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, format!("User {} not found", username)))?;
        Ok(record.to_domain())
    }

    async fn exists(&self, id: i64) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.deleted_at IS NULL \
             ORDER BY {} LIMIT $1 OFFSET $2",
            order_clause(request.sort(), USER_SORT_COLUMNS, "u.")
        );
        let (limit, offset) = to_limit_offset(request);
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let users = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(Page::new(request, users, total.max(0) as u64))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> PortResult<User> {
        let not_found = || format!("User {} not found", id);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, not_found()))?;

        sqlx::query(
            "UPDATE users SET username = COALESCE($2, username), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(changes.username.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, not_found()))?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error(e, not_found()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let result =
            sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", id)));
        }

        sqlx::query(
            "UPDATE authors SET deleted_at = now() WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query(
            "UPDATE books SET deleted_at = now() WHERE author_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `AuthorRepository` Trait Implementation
//=========================================================================================

const AUTHOR_COLUMNS: &str = "user_id, first_name, last_name, birth_date, created_at";

const AUTHOR_SORT_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "first_name",
    "last_name",
    "birth_date",
    "created_at",
];

#[async_trait]
impl AuthorRepository for DbAdapter {
    async fn create(&self, user_id: i64, author: NewAuthor) -> PortResult<Author> {
        // A soft-deleted profile is revived in place because `user_id` is the key.
        let sql = format!(
            "INSERT INTO authors (user_id, first_name, last_name, birth_date) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                first_name = EXCLUDED.first_name, \
                last_name = EXCLUDED.last_name, \
                birth_date = EXCLUDED.birth_date, \
                created_at = now(), updated_at = now(), deleted_at = NULL \
             WHERE authors.deleted_at IS NOT NULL \
             RETURNING {AUTHOR_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AuthorRecord>(&sql)
            .bind(user_id)
            .bind(&author.first_name)
            .bind(&author.last_name)
            .bind(author.birth_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, format!("User {} not found", user_id)))?
            .ok_or_else(|| {
                PortError::Conflict(format!("User {} already has an author profile", user_id))
            })?;
        Ok(record.to_domain())
    }

    async fn get_by_id(&self, user_id: i64) -> PortResult<Author> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE user_id = $1 AND deleted_at IS NULL"
        );
        let record = sqlx::query_as::<_, AuthorRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, format!("Author {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<Author>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Authors have no `id` column of their own; `user_id` plays that role.
        let order = order_clause(request.sort(), AUTHOR_SORT_COLUMNS, "");
        let order = match order.strip_prefix("id ") {
            Some(direction) => format!("user_id {direction}"),
            None => order,
        };
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE deleted_at IS NULL \
             ORDER BY {order} LIMIT $1 OFFSET $2"
        );
        let (limit, offset) = to_limit_offset(request);
        let records = sqlx::query_as::<_, AuthorRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let authors = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(Page::new(request, authors, total.max(0) as u64))
    }

    async fn update(&self, user_id: i64, changes: AuthorChanges) -> PortResult<Author> {
        let not_found = || format!("Author {} not found", user_id);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM authors WHERE user_id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, not_found()))?;

        let sql = format!(
            "UPDATE authors SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                birth_date = COALESCE($4, birth_date), \
                updated_at = now() \
             WHERE user_id = $1 AND deleted_at IS NULL \
             RETURNING {AUTHOR_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AuthorRecord>(&sql)
            .bind(user_id)
            .bind(changes.first_name.as_deref())
            .bind(changes.last_name.as_deref())
            .bind(changes.birth_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error(e, not_found()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn delete(&self, user_id: i64) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE authors SET deleted_at = now() WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Author {} not found", user_id)));
        }

        sqlx::query(
            "UPDATE books SET deleted_at = now() WHERE author_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `BookRepository` Trait Implementation
//=========================================================================================

const BOOK_COLUMNS: &str = "id, title, content, author_id, created_at";

const BOOK_SORT_COLUMNS: &[&str] = &["id", "title", "author_id", "created_at"];

#[async_trait]
impl BookRepository for DbAdapter {
    async fn create(&self, author_id: i64, book: NewBook) -> PortResult<Book> {
        let sql = format!(
            "INSERT INTO books (title, content, author_id) \
             SELECT $1, $2, $3 \
             WHERE EXISTS (SELECT 1 FROM authors WHERE user_id = $3 AND deleted_at IS NULL) \
             RETURNING {BOOK_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(&book.title)
            .bind(&book.content)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, format!("Author {} not found", author_id)))?
            .ok_or_else(|| PortError::NotFound(format!("Author {} not found", author_id)))?;
        Ok(record.to_domain())
    }

    async fn get_by_id(&self, id: i64) -> PortResult<Book> {
        let sql =
            format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1 AND deleted_at IS NULL");
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(e, format!("Book {} not found", id)))?;
        Ok(record.to_domain())
    }

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<Book>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE deleted_at IS NULL \
             ORDER BY {} LIMIT $1 OFFSET $2",
            order_clause(request.sort(), BOOK_SORT_COLUMNS, "")
        );
        let (limit, offset) = to_limit_offset(request);
        let records = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let books = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(Page::new(request, books, total.max(0) as u64))
    }

    async fn update(&self, id: i64, changes: BookChanges) -> PortResult<Book> {
        let not_found = || format!("Book {} not found", id);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM books WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_db_error(e, not_found()))?;

        let sql = format!(
            "UPDATE books SET \
                title = COALESCE($2, title), \
                content = COALESCE($3, content), \
                updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {BOOK_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BookRecord>(&sql)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.content.as_deref())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_db_error(e, not_found()))?;

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE books SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}
