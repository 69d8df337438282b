pub mod messages;
pub mod middleware_handling;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),
    #[error("Server error: {0}")]
    ServerError(anyhow::Error),
    /// Internal failure that still reports a fixed, endpoint-specific message.
    #[error("{message}: {cause}")]
    OperationFailed {
        message: &'static str,
        cause: anyhow::Error,
    },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("Token rejected: {0}")]
    TokenRejectedError(String),
    #[error("Resource exists: {0}")]
    ResourceExistsError(String),
}

impl AppError {
    pub fn invalid_credentials() -> Self {
        Self::AuthenticationError(messages::INVALID_CREDENTIALS.to_string())
    }

    pub fn access_token_missing() -> Self {
        Self::AuthenticationError(messages::ACCESS_TOKEN_MISSING.to_string())
    }

    pub fn refresh_token_missing() -> Self {
        Self::AuthenticationError(messages::REFRESH_TOKEN_MISSING.to_string())
    }

    pub fn invalid_or_expired_token() -> Self {
        Self::TokenRejectedError(messages::INVALID_OR_EXPIRED_TOKEN.to_string())
    }

    pub fn refresh_token_invalid() -> Self {
        Self::TokenRejectedError(messages::REFRESH_TOKEN_INVALID.to_string())
    }

    pub fn user_already_exists() -> Self {
        Self::ResourceExistsError(messages::USER_ALREADY_EXISTS.to_string())
    }

    pub fn profile_already_exists() -> Self {
        Self::ResourceExistsError(messages::PROFILE_ALREADY_EXISTS.to_string())
    }

    pub fn user_not_found() -> Self {
        Self::NotFoundError(messages::USER_NOT_FOUND.to_string())
    }

    pub fn profile_not_found() -> Self {
        Self::NotFoundError(messages::PROFILE_NOT_FOUND.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Wraps any internal error so the client sees `message` instead of the
    /// generic one. Client-facing kinds pass through untouched.
    pub fn with_internal_message(self, message: &'static str) -> Self {
        match self {
            Self::ConfigError(cause) | Self::DatabaseError(cause) | Self::ServerError(cause) => {
                Self::OperationFailed { message, cause }
            }
            Self::OperationFailed { cause, .. } => Self::OperationFailed { message, cause },
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::TokenRejectedError(_) => StatusCode::FORBIDDEN,
            Self::NotFoundError(_) => StatusCode::NOT_FOUND,
            Self::ResourceExistsError(_) => StatusCode::CONFLICT,
            Self::ConfigError(_)
            | Self::DatabaseError(_)
            | Self::ServerError(_)
            | Self::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::DatabaseError(_) => "DB_ERROR",
            Self::ServerError(_) | Self::OperationFailed { .. } => "SERVER_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotFoundError(_) => "NOT_FOUND",
            Self::AuthenticationError(_) => "AUTH_ERROR",
            Self::TokenRejectedError(_) => "INVALID_TOKEN",
            Self::ResourceExistsError(_) => "CONFLICT",
        }
    }

    /// Message safe to hand to clients. Internal detail never leaves the process.
    pub fn public_message(&self) -> &str {
        match self {
            Self::ValidationError(msg)
            | Self::NotFoundError(msg)
            | Self::AuthenticationError(msg)
            | Self::TokenRejectedError(msg)
            | Self::ResourceExistsError(msg) => msg.as_str(),
            Self::OperationFailed { message, .. } => *message,
            Self::ConfigError(_) | Self::DatabaseError(_) | Self::ServerError(_) => {
                messages::GENERAL_ERROR
            }
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::ServerError(error)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: code.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        let log_message = format!("[{}] {}: {}", error_code, status, self);
        if status.is_server_error() {
            tracing::error!(error_code = error_code, status_code = %status.as_u16(), "{}", log_message);
        } else {
            tracing::warn!(error_code = error_code, status_code = %status.as_u16(), "{}", log_message);
        }

        let body = Json(ErrorResponse::new(self.public_message(), error_code));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap foreign errors with a specific kind
pub trait AppErrorExt<T> {
    fn config_err(self) -> AppResult<T>;
    fn db_err(self) -> AppResult<T>;
    fn server_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn config_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ConfigError(e.into()))
    }

    fn db_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::DatabaseError(e.into()))
    }

    fn server_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ServerError(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::invalid_credentials().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::access_token_missing().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::invalid_or_expired_token().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::profile_already_exists().status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::profile_not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DatabaseError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_exposed() {
        let error = AppError::DatabaseError(anyhow::anyhow!("connection refused at 10.0.0.3"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], messages::GENERAL_ERROR);
        assert_eq!(json["code"], "DB_ERROR");
        assert!(!json.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_client_error_carries_fixed_message() {
        let response = AppError::profile_already_exists().into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let json = body_json(response).await;
        assert_eq!(json["message"], messages::PROFILE_ALREADY_EXISTS);
        assert_eq!(json["code"], "CONFLICT");
    }

    #[test]
    fn test_with_internal_message_only_touches_internal_errors() {
        let wrapped = AppError::DatabaseError(anyhow::anyhow!("disk full"))
            .with_internal_message(messages::LOGOUT_ERROR);
        assert_eq!(wrapped.public_message(), messages::LOGOUT_ERROR);
        assert!(wrapped.is_server_error());

        let untouched = AppError::refresh_token_missing().with_internal_message(messages::LOGOUT_ERROR);
        assert_eq!(untouched.public_message(), messages::REFRESH_TOKEN_MISSING);
    }

    #[test]
    fn test_db_err_extension() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "io"));
        assert!(matches!(result.db_err(), Err(AppError::DatabaseError(_))));
    }
}
