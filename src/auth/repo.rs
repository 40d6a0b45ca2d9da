use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{NewToken, NewUser, ProfileUpdate, Role, Token, TokenPurpose, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for users and their emailed tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// All users, newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>>;
    async fn set_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>>;
    async fn set_verified(&self, id: Uuid) -> StoreResult<()>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
    /// Returns false when no such user existed. Tokens go with the user.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// Stores a token, replacing any previous token for the same user and purpose.
    async fn replace_token(&self, new: NewToken) -> StoreResult<Token>;
    async fn find_token(&self, token_hash: &str, purpose: TokenPurpose) -> StoreResult<Option<Token>>;
    async fn delete_token(&self, id: Uuid) -> StoreResult<()>;
}
