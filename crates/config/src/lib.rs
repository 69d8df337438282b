use app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

mod config_loader;
pub use config_loader::*;

pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub port: u16,
    pub address: String,
}

impl Server {
    pub fn new(address: String, port: u16) -> Self {
        Self { port, address }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid server port: '0' is not a valid port number"
            )));
        }

        if self.address.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Server address cannot be empty"
            )));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Token signing material and lifetimes. Built once at startup and shared
/// read-only with the token issuer and the auth gate.
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

impl JwtConfig {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_secret: access_secret.to_vec(),
            refresh_secret: refresh_secret.to_vec(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }

    pub fn with_ttls(mut self, access_token_ttl_secs: u64, refresh_token_ttl_secs: u64) -> Self {
        self.access_token_ttl_secs = access_token_ttl_secs;
        self.refresh_token_ttl_secs = refresh_token_ttl_secs;
        self
    }
}

// Don't accidentally log secrets
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .finish()
    }
}

impl From<&AppConfig> for Server {
    fn from(config: &AppConfig) -> Self {
        Self {
            port: config.server.port,
            address: config.server.host.clone(),
        }
    }
}

impl From<&AppConfig> for JwtConfig {
    fn from(config: &AppConfig) -> Self {
        let jwt = &config.security.jwt;
        Self::new(jwt.access_secret.as_bytes(), jwt.refresh_secret.as_bytes())
            .with_ttls(jwt.access_token_ttl_secs, jwt.refresh_token_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_from_app_config() {
        let config = AppConfig::default();
        let jwt = JwtConfig::from(&config);

        assert_eq!(jwt.access_secret, b"dev_secret".to_vec());
        assert_eq!(jwt.refresh_secret, b"refresh_secret".to_vec());
        assert_eq!(jwt.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS);
        assert_eq!(jwt.refresh_token_ttl_secs, DEFAULT_REFRESH_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_jwt_config_debug_redacts_secrets() {
        let jwt = JwtConfig::new(b"super-secret", b"other-secret");
        let debug = format!("{:?}", jwt);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_server_validation() {
        assert!(Server::new("0.0.0.0".to_string(), 0).validate().is_err());
        assert!(Server::new(" ".to_string(), 80).validate().is_err());

        let server = Server::from(&AppConfig::default());
        assert!(server.validate().is_ok());
        assert_eq!(server.bind_address(), "0.0.0.0:4000");
    }
}
