use app_error::AppResult;

use crate::Database;

pub const USERS_TABLE: &str = "users";
pub const REFRESH_TOKENS_TABLE: &str = "refresh_tokens";
pub const PROFILES_TABLE: &str = "profiles";

// Profiles and refresh tokens are keyed by user id and token value, so the
// record key already enforces their uniqueness.
const SCHEMA: &str = r#"
DEFINE INDEX IF NOT EXISTS user_email ON TABLE users FIELDS email UNIQUE;
DEFINE INDEX IF NOT EXISTS user_username ON TABLE users FIELDS username UNIQUE;
DEFINE INDEX IF NOT EXISTS refresh_token_user ON TABLE refresh_tokens FIELDS user_id;
"#;

pub async fn apply_schema(db: &Database) -> AppResult<()> {
    db.query(SCHEMA).r#await().await?.check()?;
    tracing::debug!("Database schema applied");
    Ok(())
}
