use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

use app_error::{AppError, AppResult};

const EMBEDDED_CONFIG: &str = include_str!("../res/app-config.json");

/// Secrets shipped in the embedded config. Fine for local runs, refused in production.
const INSECURE_SECRETS: [&str; 2] = ["dev_secret", "refresh_secret"];

/// Upper bound for either token lifetime.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub database: SurrealDbConfig,
    pub security: SecurityConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub body_limit: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SurrealDbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    pub pool: DbPoolConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DbPoolConfig {
    pub size: usize,
    pub connection_timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtSettings,
    pub cors: CorsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub sentry: SentryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Configuration compiled into the binary
    pub fn embedded() -> Self {
        match serde_json::from_str::<AppConfig>(EMBEDDED_CONFIG) {
            Ok(conf) => conf,
            Err(e) => {
                warn!(
                    "Failed to parse embedded config: {}. Using default configuration.",
                    e
                );
                Self::default()
            }
        }
    }

    /// Load configuration: embedded defaults or `APP_CONFIG_PATH`, then `.env`
    /// and process environment overrides, then validation.
    pub fn load() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var("APP_CONFIG_PATH") {
            Ok(path) => Self::from_file(&path).map_err(AppError::ConfigError)?,
            Err(_) => Self::embedded(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!("Loaded configuration for environment: {}", config.environment);
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("APP_ENV") {
            self.environment = env;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_override("PORT", &port)?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.security.jwt.access_secret = secret;
        }
        if let Some(secret) = lookup("JWT_REFRESH_SECRET") {
            self.security.jwt.refresh_secret = secret;
        }
        if let Some(ttl) = lookup("ACCESS_TOKEN_TTL_SECS") {
            self.security.jwt.access_token_ttl_secs = parse_override("ACCESS_TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(ttl) = lookup("REFRESH_TOKEN_TTL_SECS") {
            self.security.jwt.refresh_token_ttl_secs =
                parse_override("REFRESH_TOKEN_TTL_SECS", &ttl)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.endpoint = url;
        }
        if let Some(username) = lookup("DATABASE_USERNAME") {
            self.database.username = username;
        }
        if let Some(password) = lookup("DATABASE_PASSWORD") {
            self.database.password = password;
        }
        if let Some(dsn) = lookup("SENTRY_DSN") {
            self.monitoring.sentry.dsn = dsn;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.monitoring.logging.level = level;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.is_production();

        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        if self.server.body_limit == 0 {
            errors.push("Server body limit must be greater than 0".to_string());
        }

        if self.server.request_timeout_secs == 0 {
            errors.push("Server request timeout must be greater than 0".to_string());
        }

        self.validate_database_config(is_production, &mut errors);
        self.validate_jwt_config(is_production, &mut errors);

        if !errors.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid configuration: {}",
                errors.join(", ")
            )));
        }
        Ok(())
    }

    fn validate_jwt_config(&self, is_production: bool, errors: &mut Vec<String>) {
        let jwt = &self.security.jwt;

        if jwt.access_secret.is_empty() {
            errors.push("Access token secret cannot be empty".to_string());
        }
        if jwt.refresh_secret.is_empty() {
            errors.push("Refresh token secret cannot be empty".to_string());
        }
        for (name, ttl) in [
            ("Access", jwt.access_token_ttl_secs),
            ("Refresh", jwt.refresh_token_ttl_secs),
        ] {
            if ttl == 0 {
                errors.push(format!("{} token TTL must be greater than 0", name));
            } else if ttl > MAX_TOKEN_TTL_SECS {
                errors.push(format!(
                    "{} token TTL cannot exceed {} seconds",
                    name, MAX_TOKEN_TTL_SECS
                ));
            }
        }

        if is_production {
            for (name, secret) in [("Access", &jwt.access_secret), ("Refresh", &jwt.refresh_secret)] {
                if secret.len() < 32 || INSECURE_SECRETS.contains(&secret.as_str()) {
                    errors.push(format!("{} token secret is not secure for production use", name));
                }
            }
            if jwt.access_secret == jwt.refresh_secret {
                errors.push("Access and refresh token secrets must differ".to_string());
            }
        }
    }

    fn validate_database_config(&self, is_production: bool, errors: &mut Vec<String>) {
        let db_config = &self.database;

        if db_config.endpoint.trim().is_empty() {
            errors.push("Database endpoint cannot be empty".to_string());
        } else if is_production
            && !db_config.endpoint.starts_with("wss://")
            && !db_config.endpoint.contains("memory")
        {
            errors.push("Database should use a secure 'wss://' connection in production".to_string());
        }

        if db_config.namespace.trim().is_empty() {
            errors.push("Database namespace cannot be empty".to_string());
        }

        if db_config.database.trim().is_empty() {
            errors.push("Database name cannot be empty".to_string());
        }

        if db_config.pool.size == 0 {
            errors.push("Database pool size must be greater than 0".to_string());
        }

        if is_production {
            if db_config.username == "root" {
                errors.push("Using default 'root' database username in production is insecure".to_string());
            }

            if db_config.password == "root" {
                errors.push("Using default 'root' database password in production is insecure".to_string());
            }
        }
    }
}

fn parse_override<T>(key: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                body_limit: 1048576, // 1MB
                request_timeout_secs: 30,
            },
            database: SurrealDbConfig {
                endpoint: "memory".to_string(),
                username: "root".to_string(),
                password: "root".to_string(),
                namespace: "userDb".to_string(),
                database: "profiles".to_string(),
                pool: DbPoolConfig {
                    size: 5,
                    connection_timeout: 5000,
                },
            },
            security: SecurityConfig {
                jwt: JwtSettings {
                    access_secret: "dev_secret".to_string(),
                    refresh_secret: "refresh_secret".to_string(),
                    access_token_ttl_secs: 60 * 60,
                    refresh_token_ttl_secs: 7 * 24 * 60 * 60,
                },
                cors: CorsConfig {
                    allowed_origins: vec!["*".to_string()],
                    allowed_methods: vec![
                        "GET".to_string(),
                        "POST".to_string(),
                        "PUT".to_string(),
                        "OPTIONS".to_string(),
                    ],
                    allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
                },
            },
            monitoring: MonitoringConfig {
                sentry: SentryConfig {
                    dsn: "".to_string(),
                    sample_rate: 1.0,
                    traces_sample_rate: 0.2,
                    environment: "development".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: "pretty".to_string(),
                },
            },
        }
    }
}
