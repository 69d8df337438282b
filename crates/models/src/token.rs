use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted refresh token. The token value itself is the key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(token: String, user_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            user_id,
            expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
