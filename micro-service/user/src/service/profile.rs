use app_database::{CreateOutcome, ProfileStore, UpdateOutcome, UserStore};
use app_error::{AppError, AppResult};
use app_middleware::validation::validate_profile_input;
use app_models::{Profile, ProfileInput};
use app_utils::build_profile_context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait ProfileServiceTrait: Send + Sync {
    async fn create(&self, user_id: &str, input: ProfileInput) -> AppResult<Profile>;
    async fn get(&self, user_id: &str) -> AppResult<Option<Profile>>;
    async fn update(&self, user_id: &str, input: ProfileInput) -> AppResult<Profile>;
}

pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
    users: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStore>, users: Arc<dyn UserStore>) -> Self {
        Self { profiles, users }
    }

    // Profile and user are written separately; a failure here can leave the
    // flag or context one write behind.
    async fn sync_user(&self, profile: &Profile) -> AppResult<()> {
        let Some(mut user) = self.users.find_user_by_id(&profile.user_id).await? else {
            warn!("Profile saved for unknown user {}", profile.user_id);
            return Ok(());
        };

        user.is_profile_complete = true;
        user.ai_profile_context = Some(build_profile_context(profile));

        if let UpdateOutcome::Missing = self.users.update_user(user).await? {
            warn!("User {} vanished before context update", profile.user_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileServiceTrait for ProfileService {
    async fn create(&self, user_id: &str, input: ProfileInput) -> AppResult<Profile> {
        validate_profile_input(&input)?;

        if self.profiles.find_profile(user_id).await?.is_some() {
            return Err(AppError::profile_already_exists());
        }

        let profile = Profile::from_input(user_id, input).map_err(|missing| {
            AppError::validation(format!("Missing required fields: {}", missing.join(", ")))
        })?;

        let profile = match self.profiles.create_profile(profile).await? {
            CreateOutcome::Created(profile) => profile,
            CreateOutcome::Duplicate => return Err(AppError::profile_already_exists()),
        };

        self.sync_user(&profile).await?;
        info!("Created profile for user {}", user_id);
        Ok(profile)
    }

    async fn get(&self, user_id: &str) -> AppResult<Option<Profile>> {
        self.profiles.find_profile(user_id).await
    }

    async fn update(&self, user_id: &str, input: ProfileInput) -> AppResult<Profile> {
        validate_profile_input(&input)?;

        let mut profile = self
            .profiles
            .find_profile(user_id)
            .await?
            .ok_or_else(AppError::profile_not_found)?;

        profile.apply(input);

        let profile = match self.profiles.update_profile(profile).await? {
            UpdateOutcome::Updated(profile) => profile,
            UpdateOutcome::Missing => return Err(AppError::profile_not_found()),
        };

        self.sync_user(&profile).await?;
        info!("Updated profile for user {}", user_id);
        Ok(profile)
    }
}
