use app_error::{AppError, AppResult};
use app_models::{Profile, RefreshToken, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use surrealdb::sql::{Id, Thing};
use tracing::{debug, error, warn};

use crate::{
    Database, DbService,
    schema::{PROFILES_TABLE, REFRESH_TOKENS_TABLE, USERS_TABLE},
    store::{CreateOutcome, ProfileStore, TokenStore, UpdateOutcome, UserStore},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    email: String,
    username: String,
    password_hash: String,
    is_profile_complete: bool,
    ai_profile_context: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: None,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            is_profile_complete: user.is_profile_complete,
            ai_profile_context: user.ai_profile_context,
            created_at: user.created_at,
        }
    }
}

impl UserRecord {
    fn into_user(self, fallback_id: &str) -> User {
        User {
            id: self
                .id
                .map(record_key)
                .unwrap_or_else(|| fallback_id.to_string()),
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            is_profile_complete: self.is_profile_complete,
            ai_profile_context: self.ai_profile_context,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RefreshTokenRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    #[serde(flatten)]
    token: RefreshToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Thing>,
    #[serde(flatten)]
    profile: Profile,
}

fn record_key(thing: Thing) -> String {
    match thing.id {
        Id::String(key) => key,
        other => other.to_string(),
    }
}

// The engine reports key collisions and unique index violations in its message.
fn is_duplicate(error: &AppError) -> bool {
    match error {
        AppError::DatabaseError(cause) => {
            let message = format!("{:#}", cause);
            message.contains("already exists") || message.contains("already contains")
        }
        _ => false,
    }
}

// Optimistic transactions that lose a write race abort with a retryable conflict.
fn is_conflict(error: &AppError) -> bool {
    match error {
        AppError::DatabaseError(cause) => {
            let message = format!("{:#}", cause);
            message.contains("read or write conflict") || message.contains("can be retried")
        }
        _ => false,
    }
}

const CONFLICT_RETRIES: u32 = 3;

async fn conflict_backoff(attempt: u32) {
    tokio::time::sleep(Duration::from_millis(5 * u64::from(attempt))).await;
}

/// Credential and profile storage on SurrealDB.
#[derive(Clone)]
pub struct SurrealStore {
    db: Arc<Database>,
}

impl SurrealStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn users(&self) -> DbService<'_, UserRecord> {
        DbService::new(&self.db, USERS_TABLE)
    }

    fn tokens(&self) -> DbService<'_, RefreshTokenRecord> {
        DbService::new(&self.db, REFRESH_TOKENS_TABLE)
    }

    fn profiles(&self) -> DbService<'_, ProfileRecord> {
        DbService::new(&self.db, PROFILES_TABLE)
    }

    async fn find_user_by_field(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let records = self
            .users()
            .get_records_by_field(field, value.to_string())
            .await?;

        Ok(records.into_iter().next().map(|record| record.into_user("")))
    }

    async fn user_taken(&self, user: &User) -> AppResult<bool> {
        Ok(self.users().get_record_by_id(&user.id).await?.is_some()
            || self.find_user_by_email(&user.email).await?.is_some()
            || self.find_user_by_username(&user.username).await?.is_some())
    }
}

#[async_trait]
impl UserStore for SurrealStore {
    async fn create_user(&self, user: User) -> AppResult<CreateOutcome<User>> {
        let id = user.id.clone();
        let mut attempt = 0;

        loop {
            let result = self
                .users()
                .create_record(&id, UserRecord::from(user.clone()))
                .await;

            match result {
                Ok(Some(record)) => return Ok(CreateOutcome::Created(record.into_user(&id))),
                Ok(None) => {
                    return Err(AppError::DatabaseError(anyhow::anyhow!(
                        "Create returned no user record"
                    )));
                }
                Err(e) if is_duplicate(&e) => {
                    debug!("User insert rejected by unique index");
                    return Ok(CreateOutcome::Duplicate);
                }
                Err(e) if is_conflict(&e) => {
                    if self.user_taken(&user).await? {
                        debug!("User insert lost a race to a concurrent registration");
                        return Ok(CreateOutcome::Duplicate);
                    }
                    if attempt >= CONFLICT_RETRIES {
                        error!("Failed to create user after {} retries: {}", attempt, e);
                        return Err(e);
                    }
                    attempt += 1;
                    warn!("User insert hit a transaction conflict, retry {}", attempt);
                    conflict_backoff(attempt).await;
                }
                Err(e) => {
                    error!("Failed to create user: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn find_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let record = self.users().get_record_by_id(id).await?;
        Ok(record.map(|record| record.into_user(id)))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_user_by_field("email", email).await
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_user_by_field("username", username).await
    }

    async fn update_user(&self, user: User) -> AppResult<UpdateOutcome<User>> {
        let id = user.id.clone();
        if self.users().get_record_by_id(&id).await?.is_none() {
            return Ok(UpdateOutcome::Missing);
        }

        let updated = self.users().update_record(&id, UserRecord::from(user)).await?;
        Ok(match updated {
            Some(record) => UpdateOutcome::Updated(record.into_user(&id)),
            None => UpdateOutcome::Missing,
        })
    }
}

#[async_trait]
impl TokenStore for SurrealStore {
    async fn save_refresh_token(
        &self,
        token: RefreshToken,
    ) -> AppResult<CreateOutcome<RefreshToken>> {
        let key = token.token.clone();
        let record = RefreshTokenRecord { id: None, token };

        match self.tokens().create_record(&key, record).await {
            Ok(Some(record)) => Ok(CreateOutcome::Created(record.token)),
            Ok(None) => Err(AppError::DatabaseError(anyhow::anyhow!(
                "Create returned no refresh token record"
            ))),
            Err(e) if is_duplicate(&e) => Ok(CreateOutcome::Duplicate),
            Err(e) => {
                error!("Failed to store refresh token: {}", e);
                Err(e)
            }
        }
    }

    async fn find_refresh_token(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        let record = self.tokens().get_record_by_id(token).await?;
        Ok(record.map(|record| record.token))
    }

    async fn delete_refresh_token(&self, token: &str) -> AppResult<u64> {
        let deleted = self.tokens().delete_record(token).await?;
        Ok(u64::from(deleted.is_some()))
    }
}

#[async_trait]
impl ProfileStore for SurrealStore {
    async fn create_profile(&self, profile: Profile) -> AppResult<CreateOutcome<Profile>> {
        let key = profile.user_id.clone();
        let mut attempt = 0;

        loop {
            let record = ProfileRecord {
                id: None,
                profile: profile.clone(),
            };

            match self.profiles().create_record(&key, record).await {
                Ok(Some(record)) => return Ok(CreateOutcome::Created(record.profile)),
                Ok(None) => {
                    return Err(AppError::DatabaseError(anyhow::anyhow!(
                        "Create returned no profile record"
                    )));
                }
                Err(e) if is_duplicate(&e) => {
                    debug!("Profile insert rejected, user {} already has one", key);
                    return Ok(CreateOutcome::Duplicate);
                }
                Err(e) if is_conflict(&e) => {
                    if self.profiles().get_record_by_id(&key).await?.is_some() {
                        debug!("Profile insert for user {} lost a race", key);
                        return Ok(CreateOutcome::Duplicate);
                    }
                    if attempt >= CONFLICT_RETRIES {
                        error!("Failed to create profile after {} retries: {}", attempt, e);
                        return Err(e);
                    }
                    attempt += 1;
                    warn!("Profile insert for user {} hit a transaction conflict, retry {}", key, attempt);
                    conflict_backoff(attempt).await;
                }
                Err(e) => {
                    error!("Failed to create profile: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn find_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        let record = self.profiles().get_record_by_id(user_id).await?;
        Ok(record.map(|record| record.profile))
    }

    async fn update_profile(&self, profile: Profile) -> AppResult<UpdateOutcome<Profile>> {
        let key = profile.user_id.clone();
        if self.profiles().get_record_by_id(&key).await?.is_none() {
            return Ok(UpdateOutcome::Missing);
        }

        let record = ProfileRecord { id: None, profile };
        let updated = self.profiles().update_record(&key, record).await?;
        Ok(match updated {
            Some(record) => UpdateOutcome::Updated(record.profile),
            None => UpdateOutcome::Missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::apply_schema;
    use app_models::ProfileInput;
    use chrono::{Duration, NaiveDate};

    async fn store() -> SurrealStore {
        let db = Database::initialize_memory_db(3, "store_ns", "store_db")
            .await
            .unwrap();
        apply_schema(&db).await.unwrap();
        SurrealStore::new(Arc::new(db))
    }

    fn profile(user_id: &str, city: &str) -> Profile {
        let input = ProfileInput {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15),
            city: Some(city.into()),
            country: Some("UK".into()),
            ..Default::default()
        };
        Profile::from_input(user_id, input).unwrap()
    }

    #[tokio::test]
    async fn test_user_round_trip_keeps_id() {
        let store = store().await;
        let user = User::new("a@x.com".into(), "alice".into(), "hash".into());
        let id = user.id.clone();

        let created = store.create_user(user).await.unwrap();
        assert!(matches!(&created, CreateOutcome::Created(u) if u.id == id));

        let by_email = store.find_user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, id);
        let by_name = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert!(store.find_user_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_or_username() {
        let store = store().await;
        store
            .create_user(User::new("a@x.com".into(), "alice".into(), "h".into()))
            .await
            .unwrap();

        let same_email = store
            .create_user(User::new("a@x.com".into(), "other".into(), "h".into()))
            .await
            .unwrap();
        assert_eq!(same_email, CreateOutcome::Duplicate);

        let same_name = store
            .create_user(User::new("b@x.com".into(), "alice".into(), "h".into()))
            .await
            .unwrap();
        assert_eq!(same_name, CreateOutcome::Duplicate);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = store().await;
        let ghost = User::new("g@x.com".into(), "ghost".into(), "h".into());
        assert_eq!(store.update_user(ghost).await.unwrap(), UpdateOutcome::Missing);
        assert!(store.find_user_by_email("g@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        let store = store().await;
        let token = RefreshToken::new(
            "header.payload.signature".into(),
            "user-1".into(),
            Utc::now() + Duration::days(7),
        );

        store.save_refresh_token(token.clone()).await.unwrap();
        let found = store.find_refresh_token(&token.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, "user-1");

        assert_eq!(store.delete_refresh_token(&token.token).await.unwrap(), 1);
        assert_eq!(store.delete_refresh_token(&token.token).await.unwrap(), 0);
        assert!(store.find_refresh_token(&token.token).await.unwrap().is_none());
    }

    #[test]
    fn test_error_classification() {
        let conflict = AppError::DatabaseError(anyhow::anyhow!(
            "Failed to commit transaction due to a read or write conflict. This transaction can be retried"
        ));
        assert!(is_conflict(&conflict));
        assert!(!is_duplicate(&conflict));

        let taken = AppError::DatabaseError(anyhow::anyhow!(
            "Database index `user_email` already contains 'a@x.com'"
        ));
        assert!(is_duplicate(&taken));
        assert!(!is_conflict(&taken));

        assert!(!is_conflict(&AppError::validation("read or write conflict")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_profile_creates_yield_one_winner() {
        let store = store().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_profile(profile("user-1", &format!("City {}", i)))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                CreateOutcome::Created(_) => created += 1,
                CreateOutcome::Duplicate => duplicates += 1,
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 15);
        assert!(store.find_profile("user-1").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_user_creates_yield_one_winner() {
        let store = store().await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let user = User::new("race@x.com".into(), "racer".into(), "h".into());
                    store.create_user(user).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if let CreateOutcome::Created(_) = handle.await.unwrap().unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_profile_duplicate_and_update() {
        let store = store().await;

        let first = store.create_profile(profile("user-1", "London")).await.unwrap();
        assert!(matches!(first, CreateOutcome::Created(_)));

        let second = store.create_profile(profile("user-1", "Paris")).await.unwrap();
        assert_eq!(second, CreateOutcome::Duplicate);
        let stored = store.find_profile("user-1").await.unwrap().unwrap();
        assert_eq!(stored.city, "London");

        let updated = store.update_profile(profile("user-1", "Rome")).await.unwrap();
        assert!(matches!(updated, UpdateOutcome::Updated(p) if p.city == "Rome"));

        let missing = store.update_profile(profile("user-2", "Oslo")).await.unwrap();
        assert_eq!(missing, UpdateOutcome::Missing);
    }
}
