//! services/api/src/adapters/memory.rs
//!
//! In-process implementations of every port. They back the router and service
//! tests, and follow the same soft-delete and uniqueness rules as `DbAdapter`.

use async_trait::async_trait;
use bookshelf_core::domain::{
    Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook, NewUser, User, UserChanges,
    UserCredentials,
};
use bookshelf_core::pagination::{Page, PageRequest};
use bookshelf_core::ports::{
    AuthorRepository, BookRepository, CacheService, PortError, PortResult, UserRepository,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: chrono::DateTime<Utc>,
    deleted: bool,
}

#[derive(Default)]
struct Tables {
    next_user_id: i64,
    next_book_id: i64,
    users: BTreeMap<i64, UserRow>,
    authors: BTreeMap<i64, (Author, bool)>,
    books: BTreeMap<i64, (Book, bool)>,
}

impl Tables {
    fn live_user(&self, id: i64) -> Option<&UserRow> {
        self.users.get(&id).filter(|u| !u.deleted)
    }

    fn live_author(&self, user_id: i64) -> Option<&Author> {
        self.authors
            .get(&user_id)
            .filter(|(_, deleted)| !deleted)
            .map(|(a, _)| a)
    }

    fn live_book(&self, id: i64) -> Option<&Book> {
        self.books
            .get(&id)
            .filter(|(_, deleted)| !deleted)
            .map(|(b, _)| b)
    }

    fn user_view(&self, row: &UserRow) -> User {
        User {
            id: row.id,
            username: row.username.clone(),
            is_author: self.live_author(row.id).is_some(),
            created_at: row.created_at,
        }
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| !u.deleted && u.username == username && Some(u.id) != except)
    }

    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.books
            .values()
            .any(|(b, deleted)| !deleted && b.title == title && Some(b.id) != except)
    }

    fn soft_delete_books_of(&mut self, author_id: i64) {
        for (book, deleted) in self.books.values_mut() {
            if book.author_id == author_id {
                *deleted = true;
            }
        }
    }
}

/// A comparable column value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Time(DateTime<Utc>),
}

/// Rows that can be listed with the same sort whitelist `DbAdapter` uses.
trait Sortable {
    const COLUMNS: &'static [&'static str];

    /// Value of a whitelisted `column`; anything else yields the id.
    fn sort_key(&self, column: &str) -> SortKey;
}

impl Sortable for User {
    const COLUMNS: &'static [&'static str] = &["id", "username", "created_at"];

    fn sort_key(&self, column: &str) -> SortKey {
        match column {
            "username" => SortKey::Text(self.username.clone()),
            "created_at" => SortKey::Time(self.created_at),
            _ => SortKey::Int(self.id),
        }
    }
}

impl Sortable for Author {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "first_name",
        "last_name",
        "birth_date",
        "created_at",
    ];

    fn sort_key(&self, column: &str) -> SortKey {
        match column {
            "first_name" => SortKey::Text(self.first_name.clone()),
            "last_name" => SortKey::Text(self.last_name.clone()),
            "birth_date" => SortKey::Date(self.birth_date),
            "created_at" => SortKey::Time(self.created_at),
            _ => SortKey::Int(self.user_id),
        }
    }
}

impl Sortable for Book {
    const COLUMNS: &'static [&'static str] = &["id", "title", "author_id", "created_at"];

    fn sort_key(&self, column: &str) -> SortKey {
        match column {
            "title" => SortKey::Text(self.title.clone()),
            "author_id" => SortKey::Int(self.author_id),
            "created_at" => SortKey::Time(self.created_at),
            _ => SortKey::Int(self.id),
        }
    }
}

/// Parses `"<column> [asc|desc]"` against `allowed`, falling back to `id desc`.
/// Returns the column and whether it sorts descending.
fn parse_sort<'a>(sort: &'a str, allowed: &[&str]) -> (&'a str, bool) {
    let mut parts = sort.split_whitespace();
    let column = parts.next().unwrap_or("id");
    let descending = match parts.next() {
        Some("asc") | None => false,
        Some("desc") => true,
        Some(_) => return ("id", true),
    };
    if parts.next().is_some() || !allowed.contains(&column) {
        return ("id", true);
    }
    (column, descending)
}

fn paginate<T: Sortable>(request: &PageRequest, mut rows: Vec<T>) -> Page<T> {
    let (column, descending) = parse_sort(request.sort(), T::COLUMNS);
    rows.sort_by(|a, b| {
        let order = a.sort_key(column).cmp(&b.sort_key(column));
        if descending {
            order.reverse()
        } else {
            order
        }
    });
    let total = rows.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let page = rows
        .into_iter()
        .skip(offset)
        .take(request.limit() as usize)
        .collect();
    Page::new(request, page, total)
}

//=========================================================================================
// MemoryStore
//=========================================================================================

/// A repository adapter over in-process tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many `get_all` calls reached this store, across all entities.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> PortResult<User> {
        let mut t = self.tables();
        if t.username_taken(&user.username, None) {
            return Err(PortError::Conflict(format!(
                "username {} is already taken",
                user.username
            )));
        }
        t.next_user_id += 1;
        let row = UserRow {
            id: t.next_user_id,
            username: user.username,
            password_hash: user.hashed_password,
            created_at: Utc::now(),
            deleted: false,
        };
        let view = t.user_view(&row);
        t.users.insert(row.id, row);
        Ok(view)
    }

    async fn get_by_id(&self, id: i64) -> PortResult<User> {
        let t = self.tables();
        t.live_user(id)
            .map(|row| t.user_view(row))
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))
    }

    async fn get_credentials_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        self.tables()
            .users
            .values()
            .find(|u| !u.deleted && u.username == username)
            .map(|u| UserCredentials {
                user_id: u.id,
                username: u.username.clone(),
                hashed_password: u.password_hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn exists(&self, id: i64) -> PortResult<bool> {
        Ok(self.tables().live_user(id).is_some())
    }

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<User>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let t = self.tables();
        let rows = t
            .users
            .values()
            .filter(|u| !u.deleted)
            .map(|u| t.user_view(u))
            .collect();
        Ok(paginate(request, rows))
    }

    async fn update(&self, id: i64, changes: UserChanges) -> PortResult<User> {
        let mut t = self.tables();
        if t.live_user(id).is_none() {
            return Err(PortError::NotFound(format!("User {} not found", id)));
        }
        if let Some(username) = &changes.username {
            if t.username_taken(username, Some(id)) {
                return Err(PortError::Conflict(format!(
                    "username {} is already taken",
                    username
                )));
            }
        }
        let row = t
            .users
            .get_mut(&id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?;
        if let Some(username) = changes.username {
            row.username = username;
        }
        let t = &*t;
        t.live_user(id)
            .map(|row| t.user_view(row))
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        let mut t = self.tables();
        match t.users.get_mut(&id) {
            Some(row) if !row.deleted => row.deleted = true,
            _ => return Err(PortError::NotFound(format!("User {} not found", id))),
        }
        if let Some((_, deleted)) = t.authors.get_mut(&id) {
            *deleted = true;
        }
        t.soft_delete_books_of(id);
        Ok(())
    }
}

#[async_trait]
impl AuthorRepository for MemoryStore {
    async fn create(&self, user_id: i64, author: NewAuthor) -> PortResult<Author> {
        let mut t = self.tables();
        if t.live_user(user_id).is_none() {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        if t.live_author(user_id).is_some() {
            return Err(PortError::Conflict(format!(
                "User {} already has an author profile",
                user_id
            )));
        }
        let author = Author {
            user_id,
            first_name: author.first_name,
            last_name: author.last_name,
            birth_date: author.birth_date,
            created_at: Utc::now(),
        };
        t.authors.insert(user_id, (author.clone(), false));
        Ok(author)
    }

    async fn get_by_id(&self, user_id: i64) -> PortResult<Author> {
        self.tables()
            .live_author(user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Author {} not found", user_id)))
    }

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<Author>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .tables()
            .authors
            .values()
            .filter(|(_, deleted)| !deleted)
            .map(|(a, _)| a.clone())
            .collect();
        Ok(paginate(request, rows))
    }

    async fn update(&self, user_id: i64, changes: AuthorChanges) -> PortResult<Author> {
        let mut t = self.tables();
        let author = match t.authors.get_mut(&user_id) {
            Some((author, false)) => author,
            _ => return Err(PortError::NotFound(format!("Author {} not found", user_id))),
        };
        if let Some(first_name) = changes.first_name {
            author.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            author.last_name = last_name;
        }
        if let Some(birth_date) = changes.birth_date {
            author.birth_date = birth_date;
        }
        Ok(author.clone())
    }

    async fn delete(&self, user_id: i64) -> PortResult<()> {
        let mut t = self.tables();
        match t.authors.get_mut(&user_id) {
            Some((_, deleted)) if !*deleted => *deleted = true,
            _ => return Err(PortError::NotFound(format!("Author {} not found", user_id))),
        }
        t.soft_delete_books_of(user_id);
        Ok(())
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn create(&self, author_id: i64, book: NewBook) -> PortResult<Book> {
        let mut t = self.tables();
        if t.live_author(author_id).is_none() {
            return Err(PortError::NotFound(format!("Author {} not found", author_id)));
        }
        if t.title_taken(&book.title, None) {
            return Err(PortError::Conflict(format!(
                "title {} is already taken",
                book.title
            )));
        }
        t.next_book_id += 1;
        let book = Book {
            id: t.next_book_id,
            title: book.title,
            content: book.content,
            author_id,
            created_at: Utc::now(),
        };
        t.books.insert(book.id, (book.clone(), false));
        Ok(book)
    }

    async fn get_by_id(&self, id: i64) -> PortResult<Book> {
        self.tables()
            .live_book(id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", id)))
    }

    async fn get_all(&self, request: &PageRequest) -> PortResult<Page<Book>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .tables()
            .books
            .values()
            .filter(|(_, deleted)| !deleted)
            .map(|(b, _)| b.clone())
            .collect();
        Ok(paginate(request, rows))
    }

    async fn update(&self, id: i64, changes: BookChanges) -> PortResult<Book> {
        let mut t = self.tables();
        if t.live_book(id).is_none() {
            return Err(PortError::NotFound(format!("Book {} not found", id)));
        }
        if let Some(title) = &changes.title {
            if t.title_taken(title, Some(id)) {
                return Err(PortError::Conflict(format!("title {} is already taken", title)));
            }
        }
        let book = match t.books.get_mut(&id) {
            Some((book, false)) => book,
            _ => return Err(PortError::NotFound(format!("Book {} not found", id))),
        };
        if let Some(title) = changes.title {
            book.title = title;
        }
        if let Some(content) = changes.content {
            book.content = content;
        }
        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        match self.tables().books.get_mut(&id) {
            Some((_, deleted)) if !*deleted => {
                *deleted = true;
                Ok(())
            }
            _ => Err(PortError::NotFound(format!("Book {} not found", id))),
        }
    }
}

//=========================================================================================
// MemoryCache
//=========================================================================================

/// A cache adapter over a plain map. Entries never expire, but the TTL each one
/// was stored with is kept for inspection.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    /// TTL passed with the last `set` of `key`.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries().get(key).map(|(_, ttl)| *ttl)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, (String, Duration)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries().get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()> {
        self.entries().insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }
}
