use app_error::{AppError, AppResult};
use app_models::{Profile, RefreshToken, User};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::RwLock;

use crate::store::{CreateOutcome, ProfileStore, TokenStore, UpdateOutcome, UserStore};

/// In-process store with the same uniqueness rules as the SurrealDB schema.
/// Used by tests and local runs that need no database at all.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    tokens: RwLock<HashMap<String, RefreshToken>>,
    profiles: RwLock<HashMap<String, Profile>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail like a lost database connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "memory store is unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: User) -> AppResult<CreateOutcome<User>> {
        self.ensure_available()?;
        let mut users = self.users.write().await;

        let taken = users.values().any(|existing| {
            existing.id == user.id
                || existing.email == user.email
                || existing.username == user.username
        });
        if taken {
            return Ok(CreateOutcome::Duplicate);
        }

        users.insert(user.id.clone(), user.clone());
        Ok(CreateOutcome::Created(user))
    }

    async fn find_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.ensure_available()?;
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.ensure_available()?;
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.ensure_available()?;
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.username == username).cloned())
    }

    async fn update_user(&self, user: User) -> AppResult<UpdateOutcome<User>> {
        self.ensure_available()?;
        let mut users = self.users.write().await;

        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(UpdateOutcome::Updated(user))
            }
            None => Ok(UpdateOutcome::Missing),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn save_refresh_token(
        &self,
        token: RefreshToken,
    ) -> AppResult<CreateOutcome<RefreshToken>> {
        self.ensure_available()?;
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(&token.token) {
            return Ok(CreateOutcome::Duplicate);
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(CreateOutcome::Created(token))
    }

    async fn find_refresh_token(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        self.ensure_available()?;
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn delete_refresh_token(&self, token: &str) -> AppResult<u64> {
        self.ensure_available()?;
        let removed = self.tokens.write().await.remove(token);
        Ok(u64::from(removed.is_some()))
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(&self, profile: Profile) -> AppResult<CreateOutcome<Profile>> {
        self.ensure_available()?;
        let mut profiles = self.profiles.write().await;

        if profiles.contains_key(&profile.user_id) {
            return Ok(CreateOutcome::Duplicate);
        }
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(CreateOutcome::Created(profile))
    }

    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        self.ensure_available()?;
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    async fn update_profile(&self, profile: Profile) -> AppResult<UpdateOutcome<Profile>> {
        self.ensure_available()?;
        let mut profiles = self.profiles.write().await;

        match profiles.get_mut(&profile.user_id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(UpdateOutcome::Updated(profile))
            }
            None => Ok(UpdateOutcome::Missing),
        }
    }
}
