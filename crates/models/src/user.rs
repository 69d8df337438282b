use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::Profile;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_profile_complete: bool,
    #[serde(default)]
    pub ai_profile_context: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    // New users always start with an incomplete profile
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        Self {
            id: Self::generate_id(),
            email,
            username,
            password_hash,
            is_profile_complete: false,
            ai_profile_context: None,
            created_at: Utc::now(),
        }
    }
}

/// Public projection of a user, hiding the password hash and cached context.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            is_profile_complete: user.is_profile_complete,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: UserView,
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshInput {
    pub refresh_token: Option<String>,
}

impl RefreshInput {
    /// The token, if one was supplied and is not blank
    pub fn token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegisteredUser {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub is_profile_complete: bool,
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}
