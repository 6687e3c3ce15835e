//! services/api/src/services/authors.rs

use bookshelf_core::domain::{AuthorChanges, Identity, NewAuthor};
use bookshelf_core::pagination::{Page, PageRequest};
use bookshelf_core::ports::{AuthorRepository, CacheService, PortError, PortResult};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;

use crate::models::{non_blank, AuthorResponse, CreateAuthorRequest, UpdateAuthorRequest};
use crate::services::cache::{cached, item_key, list_key};
use crate::services::{check_length, nothing_to_update};

const NAME_MAX: usize = 100;

fn check_name(field: &str, value: &str) -> PortResult<()> {
    check_length(field, value, 1, Some(NAME_MAX))
}

fn check_birth_date(date: NaiveDate) -> PortResult<()> {
    if date > Utc::now().date_naive() {
        return Err(PortError::Validation(
            "birth_date cannot be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Author profiles. Each user owns at most one, keyed by their own id.
pub struct AuthorService {
    repo: Arc<dyn AuthorRepository>,
    cache: Arc<dyn CacheService>,
}

impl AuthorService {
    pub fn new(repo: Arc<dyn AuthorRepository>, cache: Arc<dyn CacheService>) -> Self {
        Self { repo, cache }
    }

    /// Creates the caller's author profile.
    pub async fn create(
        &self,
        identity: &Identity,
        req: CreateAuthorRequest,
    ) -> PortResult<AuthorResponse> {
        let first_name = req.first_name.trim().to_string();
        let last_name = req.last_name.trim().to_string();
        check_name("first_name", &first_name)?;
        check_name("last_name", &last_name)?;
        check_birth_date(req.birth_date)?;

        let author = self
            .repo
            .create(
                identity.user_id,
                NewAuthor {
                    first_name,
                    last_name,
                    birth_date: req.birth_date,
                },
            )
            .await?;
        info!(user_id = identity.user_id, "author profile created");
        Ok(author.into())
    }

    pub async fn get_all(&self, request: &PageRequest) -> PortResult<Page<AuthorResponse>> {
        cached(self.cache.as_ref(), &list_key("authors", request), || async {
            self.repo.get_all(request).await.map(|page| page.map(AuthorResponse::from))
        })
        .await
    }

    pub async fn get_by_id(&self, user_id: i64) -> PortResult<AuthorResponse> {
        cached(self.cache.as_ref(), &item_key("author", user_id), || async {
            self.repo.get_by_id(user_id).await.map(AuthorResponse::from)
        })
        .await
    }

    /// Updates the caller's own profile.
    pub async fn update(
        &self,
        identity: &Identity,
        req: UpdateAuthorRequest,
    ) -> PortResult<AuthorResponse> {
        let changes = AuthorChanges {
            first_name: non_blank(req.first_name).map(|v| v.trim().to_string()),
            last_name: non_blank(req.last_name).map(|v| v.trim().to_string()),
            birth_date: req.birth_date,
        };
        if changes.is_empty() {
            return Err(nothing_to_update());
        }
        if let Some(first_name) = &changes.first_name {
            check_name("first_name", first_name)?;
        }
        if let Some(last_name) = &changes.last_name {
            check_name("last_name", last_name)?;
        }
        if let Some(birth_date) = changes.birth_date {
            check_birth_date(birth_date)?;
        }
        Ok(self.repo.update(identity.user_id, changes).await?.into())
    }

    /// Deletes the caller's own profile and every book in it.
    pub async fn delete(&self, identity: &Identity) -> PortResult<()> {
        self.repo.delete(identity.user_id).await?;
        info!(user_id = identity.user_id, "author profile deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryCache, MemoryStore};
    use bookshelf_core::domain::NewUser;
    use bookshelf_core::ports::UserRepository;
    use chrono::Duration;

    async fn setup() -> (AuthorService, Identity) {
        let store = Arc::new(MemoryStore::new());
        let user = UserRepository::create(
            store.as_ref(),
            NewUser {
                username: "writer".into(),
                hashed_password: "hash".into(),
            },
        )
        .await
        .unwrap();
        let service = AuthorService::new(store, Arc::new(MemoryCache::new()));
        (service, Identity { user_id: user.id, username: user.username })
    }

    fn profile() -> CreateAuthorRequest {
        CreateAuthorRequest {
            first_name: "Octavia".into(),
            last_name: "Butler".into(),
            birth_date: NaiveDate::from_ymd_opt(1947, 6, 22).unwrap(),
        }
    }

    #[tokio::test]
    async fn profile_is_keyed_by_user() {
        let (authors, me) = setup().await;
        let created = authors.create(&me, profile()).await.unwrap();
        assert_eq!(created.user_id, me.user_id);
        assert_eq!(authors.get_by_id(me.user_id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn second_profile_conflicts() {
        let (authors, me) = setup().await;
        authors.create(&me, profile()).await.unwrap();
        assert!(matches!(
            authors.create(&me, profile()).await,
            Err(PortError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn future_birth_date_is_rejected() {
        let (authors, me) = setup().await;
        let mut req = profile();
        req.birth_date = Utc::now().date_naive() + Duration::days(2);
        assert!(matches!(authors.create(&me, req).await, Err(PortError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (authors, me) = setup().await;
        let mut req = profile();
        req.last_name = "  ".into();
        assert!(matches!(authors.create(&me, req).await, Err(PortError::Validation(_))));
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let (authors, me) = setup().await;
        authors.create(&me, profile()).await.unwrap();
        let updated = authors
            .update(
                &me,
                UpdateAuthorRequest {
                    first_name: Some("Octavia E.".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Octavia E.");
        assert_eq!(updated.last_name, "Butler");
    }

    #[tokio::test]
    async fn update_without_profile_is_not_found() {
        let (authors, me) = setup().await;
        let req = UpdateAuthorRequest {
            last_name: Some("Nobody".into()),
            ..Default::default()
        };
        assert!(matches!(authors.update(&me, req).await, Err(PortError::NotFound(_))));
    }
}
