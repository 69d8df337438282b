use app_config::JwtConfig;
use app_error::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,     // Subject (user ID)
    pub exp: i64,        // Expiration time
    pub iat: i64,        // Issued at
    pub jti: String,     // Unique token id
    pub typ: TokenKind,
}

/// An encoded token together with the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl KeyPair {
    fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::ServerError(anyhow::anyhow!(
                    "Token lifetime of {} seconds is out of range",
                    self.ttl_secs
                ))
            })
    }
}

pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: KeyPair::new(&config.access_secret, config.access_token_ttl_secs),
            refresh: KeyPair::new(&config.refresh_secret, config.refresh_token_ttl_secs),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn issue(&self, user_id: &str, kind: TokenKind) -> AppResult<IssuedToken> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let expires_at = keys.expiry_from(now)?;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::ServerError(anyhow::anyhow!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn issue_access(&self, user_id: &str) -> AppResult<IssuedToken> {
        self.issue(user_id, TokenKind::Access)
    }

    pub fn issue_refresh(&self, user_id: &str) -> AppResult<IssuedToken> {
        self.issue(user_id, TokenKind::Refresh)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| {
                warn!("Token validation failed: {}", e);
                AppError::invalid_or_expired_token()
            })?;

        // Same secret for both kinds must still not let one pass as the other
        if token_data.claims.typ != kind {
            warn!("Rejected {:?} token presented as {:?}", token_data.claims.typ, kind);
            return Err(AppError::invalid_or_expired_token());
        }

        debug!("Token validated for user: {}", token_data.claims.sub);
        Ok(token_data.claims)
    }

    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenKind::Refresh)
    }
}
