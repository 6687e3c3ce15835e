//! services/api/src/services/books.rs

use bookshelf_core::domain::{BookChanges, Identity, NewBook};
use bookshelf_core::pagination::{Page, PageRequest};
use bookshelf_core::ports::{
    AuthorRepository, BookRepository, CacheService, PortError, PortResult,
};
use std::sync::Arc;
use tracing::info;

use crate::models::{non_blank, BookResponse, CreateBookRequest, UpdateBookRequest};
use crate::services::cache::{cached, item_key, list_key};
use crate::services::{check_length, nothing_to_update};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 400;
const CONTENT_MIN: usize = 10;

/// Books and the ownership rules around them.
pub struct BookService {
    repo: Arc<dyn BookRepository>,
    authors: Arc<dyn AuthorRepository>,
    cache: Arc<dyn CacheService>,
}

impl BookService {
    pub fn new(
        repo: Arc<dyn BookRepository>,
        authors: Arc<dyn AuthorRepository>,
        cache: Arc<dyn CacheService>,
    ) -> Self {
        Self {
            repo,
            authors,
            cache,
        }
    }

    /// Publishes a book under the caller's author profile.
    pub async fn create(
        &self,
        identity: &Identity,
        req: CreateBookRequest,
    ) -> PortResult<BookResponse> {
        let title = req.title.trim().to_string();
        check_length("title", &title, TITLE_MIN, Some(TITLE_MAX))?;
        check_length("content", &req.content, CONTENT_MIN, None)?;

        match self.authors.get_by_id(identity.user_id).await {
            Ok(_) => {}
            Err(PortError::NotFound(_)) => {
                return Err(PortError::Forbidden(
                    "an author profile is required to publish books".to_string(),
                ))
            }
            Err(e) => return Err(e),
        }

        let book = self
            .repo
            .create(
                identity.user_id,
                NewBook {
                    title,
                    content: req.content,
                },
            )
            .await?;
        info!(book_id = book.id, author_id = book.author_id, "book created");
        Ok(book.into())
    }

    pub async fn get_all(&self, request: &PageRequest) -> PortResult<Page<BookResponse>> {
        cached(self.cache.as_ref(), &list_key("books", request), || async {
            self.repo.get_all(request).await.map(|page| page.map(BookResponse::from))
        })
        .await
    }

    pub async fn get_by_id(&self, id: i64) -> PortResult<BookResponse> {
        cached(self.cache.as_ref(), &item_key("book", id), || async {
            self.repo.get_by_id(id).await.map(BookResponse::from)
        })
        .await
    }

    /// Updates a book owned by the caller.
    pub async fn update(
        &self,
        identity: &Identity,
        id: i64,
        req: UpdateBookRequest,
    ) -> PortResult<BookResponse> {
        let book = self.repo.get_by_id(id).await?;
        identity.ensure_owns(book.author_id)?;

        let changes = BookChanges {
            title: non_blank(req.title).map(|t| t.trim().to_string()),
            content: non_blank(req.content),
        };
        if changes.is_empty() {
            return Err(nothing_to_update());
        }
        if let Some(title) = &changes.title {
            check_length("title", title, TITLE_MIN, Some(TITLE_MAX))?;
        }
        if let Some(content) = &changes.content {
            check_length("content", content, CONTENT_MIN, None)?;
        }
        Ok(self.repo.update(id, changes).await?.into())
    }

    /// Deletes a book owned by the caller.
    pub async fn delete(&self, identity: &Identity, id: i64) -> PortResult<()> {
        let book = self.repo.get_by_id(id).await?;
        identity.ensure_owns(book.author_id)?;
        self.repo.delete(id).await?;
        info!(book_id = id, "book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryCache, MemoryStore};
    use bookshelf_core::domain::{NewAuthor, NewUser};
    use bookshelf_core::ports::UserRepository;
    use chrono::NaiveDate;

    struct Fixture {
        store: Arc<MemoryStore>,
        books: BookService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let books = BookService::new(store.clone(), store.clone(), Arc::new(MemoryCache::new()));
        Fixture { store, books }
    }

    async fn user(store: &MemoryStore, name: &str, with_profile: bool) -> Identity {
        let user = UserRepository::create(
            store,
            NewUser {
                username: name.into(),
                hashed_password: "hash".into(),
            },
        )
        .await
        .unwrap();
        if with_profile {
            AuthorRepository::create(
                store,
                user.id,
                NewAuthor {
                    first_name: "First".into(),
                    last_name: "Last".into(),
                    birth_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
                },
            )
            .await
            .unwrap();
        }
        Identity { user_id: user.id, username: user.username }
    }

    fn book_req(title: &str) -> CreateBookRequest {
        CreateBookRequest {
            title: title.into(),
            content: "It was a bright cold day in April.".into(),
        }
    }

    #[tokio::test]
    async fn created_book_round_trips() {
        let f = fixture();
        let me = user(&f.store, "writer", true).await;
        let created = f.books.create(&me, book_req("Nineteen Eighty-Four")).await.unwrap();
        let fetched = f.books.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.title, "Nineteen Eighty-Four");
        assert_eq!(fetched.content, "It was a bright cold day in April.");
        assert_eq!(fetched.author_id, me.user_id);
    }

    #[tokio::test]
    async fn publishing_requires_author_profile() {
        let f = fixture();
        let reader = user(&f.store, "reader", false).await;
        assert!(matches!(
            f.books.create(&reader, book_req("Nineteen Eighty-Four")).await,
            Err(PortError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn invalid_title_and_content_are_rejected() {
        let f = fixture();
        let me = user(&f.store, "writer", true).await;
        assert!(matches!(
            f.books.create(&me, book_req("ab")).await,
            Err(PortError::Validation(_))
        ));
        let short = CreateBookRequest {
            title: "Animal Farm".into(),
            content: "short".into(),
        };
        assert!(matches!(f.books.create(&me, short).await, Err(PortError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_title_conflicts() {
        let f = fixture();
        let me = user(&f.store, "writer", true).await;
        f.books.create(&me, book_req("Animal Farm")).await.unwrap();
        assert!(matches!(
            f.books.create(&me, book_req("Animal Farm")).await,
            Err(PortError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn non_owner_cannot_touch_book() {
        let f = fixture();
        let owner = user(&f.store, "writer", true).await;
        let other = user(&f.store, "intruder", true).await;
        let book = f.books.create(&owner, book_req("Animal Farm")).await.unwrap();

        let update = UpdateBookRequest {
            title: Some("Stolen Farm".into()),
            content: None,
        };
        assert!(matches!(
            f.books.update(&other, book.id, update).await,
            Err(PortError::Forbidden(_))
        ));
        assert!(matches!(
            f.books.delete(&other, book.id).await,
            Err(PortError::Forbidden(_))
        ));

        let stored = BookRepository::get_by_id(f.store.as_ref(), book.id).await.unwrap();
        assert_eq!(stored.title, "Animal Farm");
    }

    #[tokio::test]
    async fn non_owner_is_forbidden_even_with_invalid_input() {
        let f = fixture();
        let owner = user(&f.store, "writer", true).await;
        let other = user(&f.store, "intruder", true).await;
        let book = f.books.create(&owner, book_req("Animal Farm")).await.unwrap();

        let bodies = [
            UpdateBookRequest::default(),
            UpdateBookRequest { title: Some("ab".into()), content: None },
            UpdateBookRequest { title: None, content: Some("short".into()) },
        ];
        for body in bodies {
            assert!(matches!(
                f.books.update(&other, book.id, body).await,
                Err(PortError::Forbidden(_))
            ));
        }
    }

    #[tokio::test]
    async fn owner_updates_and_deletes() {
        let f = fixture();
        let me = user(&f.store, "writer", true).await;
        let book = f.books.create(&me, book_req("Animal Farm")).await.unwrap();

        let updated = f
            .books
            .update(
                &me,
                book.id,
                UpdateBookRequest {
                    title: None,
                    content: Some("All animals are equal.".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Animal Farm");
        assert_eq!(updated.content, "All animals are equal.");

        f.books.delete(&me, book.id).await.unwrap();
        assert!(matches!(
            BookRepository::get_by_id(f.store.as_ref(), book.id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let f = fixture();
        let me = user(&f.store, "writer", true).await;
        assert!(matches!(f.books.delete(&me, 999).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn listing_within_ttl_skips_the_store() {
        let f = fixture();
        let me = user(&f.store, "writer", true).await;
        f.books.create(&me, book_req("Animal Farm")).await.unwrap();

        let request = PageRequest::new(5, 1, "");
        let first = f.books.get_all(&request).await.unwrap();
        f.books.create(&me, book_req("Burmese Days")).await.unwrap();
        let second = f.books.get_all(&request).await.unwrap();

        assert_eq!(f.store.list_calls(), 1);
        assert_eq!(second, first);
        assert_eq!(second.total_rows, 1);
    }
}
