use app_error::AppResult;
use app_models::{Profile, RefreshToken, User};
use async_trait::async_trait;

/// Result of an insert where the store itself arbitrates uniqueness.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome<T> {
    Created(T),
    Duplicate,
}

/// Result of an update addressed by key.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<T> {
    Updated(T),
    Missing,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Duplicate` when the email or username is already taken.
    async fn create_user(&self, user: User) -> AppResult<CreateOutcome<User>>;
    async fn find_user_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn update_user(&self, user: User) -> AppResult<UpdateOutcome<User>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save_refresh_token(
        &self,
        token: RefreshToken,
    ) -> AppResult<CreateOutcome<RefreshToken>>;
    async fn find_refresh_token(&self, token: &str) -> AppResult<Option<RefreshToken>>;
    /// Returns how many rows were removed. Zero is not an error.
    async fn delete_refresh_token(&self, token: &str) -> AppResult<u64>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Duplicate` when the user already has a profile.
    async fn create_profile(&self, profile: Profile) -> AppResult<CreateOutcome<Profile>>;
    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>>;
    async fn update_profile(&self, profile: Profile) -> AppResult<UpdateOutcome<Profile>>;
}
