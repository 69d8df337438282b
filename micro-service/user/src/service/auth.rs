use app_config::JwtConfig;
use app_database::{CreateOutcome, ProfileStore, TokenStore, UpdateOutcome, UserStore};
use app_error::{AppError, AppResult};
use app_middleware::{JwtService, security::password, validation};
use app_models::{
    LoginInput, LoginResponse, RefreshToken, RegisterInput, RegisteredUser, User, UserView,
    UserWithProfile,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Registration, login and the refresh-token session lifecycle
#[async_trait]
pub trait AuthServiceTrait: Send + Sync {
    /// Create an account. Does not log the user in.
    async fn register(&self, input: RegisterInput) -> AppResult<RegisteredUser>;

    /// Check credentials and open a session (one access + one stored refresh token)
    async fn login(&self, input: LoginInput) -> AppResult<LoginResponse>;

    /// Mint a new access token from a stored, unexpired refresh token
    async fn refresh(&self, refresh_token: &str) -> AppResult<String>;

    /// Forget a refresh token. Unknown tokens are not an error.
    async fn logout(&self, refresh_token: &str) -> AppResult<()>;

    async fn get_user_by_id(&self, user_id: &str) -> AppResult<UserWithProfile>;

    async fn complete_profile(&self, user_id: &str) -> AppResult<UserView>;

    fn get_jwt_service(&self) -> Arc<JwtService>;
}

pub struct AuthService {
    jwt_service: Arc<JwtService>,
    user_store: Option<Arc<dyn UserStore>>,
    token_store: Option<Arc<dyn TokenStore>>,
    profile_store: Option<Arc<dyn ProfileStore>>,
}

fn store_unavailable() -> AppError {
    AppError::ServerError(anyhow::anyhow!("Database not available"))
}

impl AuthService {
    pub fn new(jwt_config: &JwtConfig) -> Self {
        Self {
            jwt_service: Arc::new(JwtService::new(jwt_config)),
            user_store: None,
            token_store: None,
            profile_store: None,
        }
    }

    pub fn with_user_store(mut self, user_store: Arc<dyn UserStore>) -> Self {
        self.user_store = Some(user_store);
        self
    }

    pub fn with_token_store(mut self, token_store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(token_store);
        self
    }

    pub fn with_profile_store(mut self, profile_store: Arc<dyn ProfileStore>) -> Self {
        self.profile_store = Some(profile_store);
        self
    }

    /// Wires one backend that serves every store role
    pub fn with_store<S>(self, store: Arc<S>) -> Self
    where
        S: UserStore + TokenStore + ProfileStore + 'static,
    {
        self.with_user_store(store.clone())
            .with_token_store(store.clone())
            .with_profile_store(store)
    }

    fn users(&self) -> AppResult<&Arc<dyn UserStore>> {
        self.user_store.as_ref().ok_or_else(store_unavailable)
    }

    fn tokens(&self) -> AppResult<&Arc<dyn TokenStore>> {
        self.token_store.as_ref().ok_or_else(store_unavailable)
    }

    fn profiles(&self) -> AppResult<&Arc<dyn ProfileStore>> {
        self.profile_store.as_ref().ok_or_else(store_unavailable)
    }

    async fn check_user_exists(&self, email: &str, username: &str) -> AppResult<()> {
        let users = self.users()?;

        if users.find_user_by_email(email).await?.is_some() {
            debug!("Registration rejected, email already in use");
            return Err(AppError::user_already_exists());
        }

        if users.find_user_by_username(username).await?.is_some() {
            debug!("Registration rejected, username {} already in use", username);
            return Err(AppError::user_already_exists());
        }

        Ok(())
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    fn get_jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    async fn register(&self, input: RegisterInput) -> AppResult<RegisteredUser> {
        let input = validation::sanitize_registration(input)?;

        self.check_user_exists(&input.email, &input.username).await?;

        let password_hash = password::hash_password(&input.password)?;
        let user = User::new(input.email, input.username, password_hash);

        // The unique indexes still decide when two registrations race
        match self.users()?.create_user(user).await? {
            CreateOutcome::Created(user) => {
                info!("Registered new user {}", user.id);
                Ok(RegisteredUser { id: user.id })
            }
            CreateOutcome::Duplicate => Err(AppError::user_already_exists()),
        }
    }

    async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let input = validation::sanitize_login(input)?;

        let Some(user) = self.users()?.find_user_by_email(&input.email).await? else {
            warn!("Login failed: unknown email");
            return Err(AppError::invalid_credentials());
        };

        if !password::verify_password(&input.password, &user.password_hash) {
            warn!("Login failed: bad password for user {}", user.id);
            return Err(AppError::invalid_credentials());
        }

        let access = self.jwt_service.issue_access(&user.id)?;
        let refresh = self.jwt_service.issue_refresh(&user.id)?;

        let record = RefreshToken::new(refresh.token.clone(), user.id.clone(), refresh.expires_at);
        if let CreateOutcome::Duplicate = self.tokens()?.save_refresh_token(record).await? {
            error!("Refresh token collision for user {}", user.id);
            return Err(AppError::ServerError(anyhow::anyhow!(
                "Issued refresh token already stored"
            )));
        }

        info!("User {} logged in", user.id);
        Ok(LoginResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            is_profile_complete: user.is_profile_complete,
            user_id: user.id,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.jwt_service.verify_refresh(refresh_token)?;

        let Some(stored) = self.tokens()?.find_refresh_token(refresh_token).await? else {
            warn!("Refresh token for user {} is not on record", claims.sub);
            return Err(AppError::invalid_or_expired_token());
        };

        if stored.is_expired() {
            warn!("Refresh token for user {} expired at {}", claims.sub, stored.expires_at);
            return Err(AppError::invalid_or_expired_token());
        }

        if stored.user_id != claims.sub {
            warn!("Refresh token record does not belong to user {}", claims.sub);
            return Err(AppError::invalid_or_expired_token());
        }

        let access = self.jwt_service.issue_access(&claims.sub)?;
        debug!("Issued new access token for user {}", claims.sub);
        Ok(access.token)
    }

    async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let removed = self.tokens()?.delete_refresh_token(refresh_token).await?;
        info!("Logout removed {} refresh token(s)", removed);
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: &str) -> AppResult<UserWithProfile> {
        let user = self
            .users()?
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        let profile = self.profiles()?.find_profile(user_id).await?;

        Ok(UserWithProfile {
            user: UserView::from(user),
            profile,
        })
    }

    async fn complete_profile(&self, user_id: &str) -> AppResult<UserView> {
        let users = self.users()?;
        let mut user = users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(AppError::user_not_found)?;

        user.is_profile_complete = true;

        match users.update_user(user).await? {
            UpdateOutcome::Updated(user) => {
                info!("Marked profile complete for user {}", user.id);
                Ok(UserView::from(user))
            }
            UpdateOutcome::Missing => Err(AppError::user_not_found()),
        }
    }
}
