//! services/api/src/services/users.rs

use bookshelf_core::domain::{Identity, NewUser, UserChanges};
use bookshelf_core::pagination::{Page, PageRequest};
use bookshelf_core::ports::{CacheService, PortError, PortResult, UserRepository};
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

use crate::models::{non_blank, LoginRequest, RegisterRequest, UpdateUserRequest, UserResponse};
use crate::services::cache::{cached, item_key, list_key};
use crate::services::password::{hash_password, verify_password};
use crate::services::tokens::TokenIssuer;
use crate::services::{check_length, nothing_to_update};

const USERNAME_MIN: usize = 5;
const USERNAME_MAX: usize = 64;
const PASSWORD_MIN: usize = 8;

const INVALID_LOGIN: &str = "invalid username or password";

/// Registration, login, session verification and self-service account management.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheService>,
    tokens: TokenIssuer,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheService>,
        tokens: TokenIssuer,
    ) -> Self {
        Self { repo, cache, tokens }
    }

    pub async fn register(&self, req: RegisterRequest) -> PortResult<UserResponse> {
        let RegisterRequest { username, password } = req;
        let password = Zeroizing::new(password);
        let username = username.trim().to_string();
        check_length("username", &username, USERNAME_MIN, Some(USERNAME_MAX))?;
        check_length("password", &password, PASSWORD_MIN, None)?;

        let hashed_password = hash_password(password)?;
        let user = self
            .repo
            .create(NewUser {
                username,
                hashed_password,
            })
            .await?;
        info!(user_id = user.id, "user registered");
        Ok(user.into())
    }

    /// Verifies the credentials and returns a fresh session token with the user.
    pub async fn login(&self, req: LoginRequest) -> PortResult<(String, UserResponse)> {
        let LoginRequest { username, password } = req;
        let password = Zeroizing::new(password);
        let credentials = match self
            .repo
            .get_credentials_by_username(username.trim())
            .await
        {
            Ok(credentials) => credentials,
            Err(PortError::NotFound(_)) => {
                return Err(PortError::Unauthorized(INVALID_LOGIN.to_string()))
            }
            Err(e) => return Err(e),
        };

        if !verify_password(&password, &credentials.hashed_password)? {
            return Err(PortError::Unauthorized(INVALID_LOGIN.to_string()));
        }

        let token = self
            .tokens
            .issue(credentials.user_id, &credentials.username)?;
        let user = self.repo.get_by_id(credentials.user_id).await?;
        Ok((token, user.into()))
    }

    /// Resolves a session token to the caller's identity. The user must still exist.
    pub async fn authenticate(&self, token: &str) -> PortResult<Identity> {
        let claims = self.tokens.verify(token)?;
        if !self.repo.exists(claims.user_id).await? {
            return Err(PortError::Unauthorized(
                "account no longer exists".to_string(),
            ));
        }
        Ok(Identity {
            user_id: claims.user_id,
            username: claims.username,
        })
    }

    pub async fn get_all(&self, request: &PageRequest) -> PortResult<Page<UserResponse>> {
        cached(self.cache.as_ref(), &list_key("users", request), || async {
            self.repo.get_all(request).await.map(|page| page.map(UserResponse::from))
        })
        .await
    }

    pub async fn get_by_id(&self, id: i64) -> PortResult<UserResponse> {
        cached(self.cache.as_ref(), &item_key("user", id), || async {
            self.repo.get_by_id(id).await.map(UserResponse::from)
        })
        .await
    }

    /// Updates the caller's own account.
    pub async fn update(
        &self,
        identity: &Identity,
        req: UpdateUserRequest,
    ) -> PortResult<UserResponse> {
        let changes = UserChanges {
            username: non_blank(req.username).map(|u| u.trim().to_string()),
        };
        if changes.is_empty() {
            return Err(nothing_to_update());
        }
        if let Some(username) = &changes.username {
            check_length("username", username, USERNAME_MIN, Some(USERNAME_MAX))?;
        }
        Ok(self.repo.update(identity.user_id, changes).await?.into())
    }

    /// Deletes the caller's own account together with their author profile and books.
    pub async fn delete(&self, identity: &Identity) -> PortResult<()> {
        self.repo.delete(identity.user_id).await?;
        info!(user_id = identity.user_id, "user deleted");
        Ok(())
    }
}
