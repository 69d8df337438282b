use app_error::{AppError, AppResult, messages};
use app_middleware::AuthenticatedUser;
use app_models::{AccessTokenResponse, LoginInput, RefreshInput, RegisterInput};
use axum::{Extension, http::StatusCode, response::Response};
use serde_json::json;
use std::sync::Arc;

use super::{ApiResponse, JsonBody};
use crate::service::AuthServiceTrait;

pub async fn register(
    Extension(auth_service): Extension<Arc<dyn AuthServiceTrait>>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> AppResult<Response> {
    let registered = auth_service.register(input).await.map_err(|e| match e {
        // Clients of this endpoint expect a duplicate to be a plain bad request
        AppError::ResourceExistsError(message) => AppError::ValidationError(message),
        other => other,
    })?;

    Ok(ApiResponse::ok(
        messages::USER_REGISTERED,
        json!({ "user": registered, "redirectToLogin": true }),
    )
    .with_status(StatusCode::CREATED))
}

pub async fn login(
    Extension(auth_service): Extension<Arc<dyn AuthServiceTrait>>,
    JsonBody(input): JsonBody<LoginInput>,
) -> AppResult<Response> {
    let session = auth_service.login(input).await?;
    Ok(ApiResponse::ok(messages::USER_LOGGED_IN, session).with_status(StatusCode::OK))
}

pub async fn refresh(
    Extension(auth_service): Extension<Arc<dyn AuthServiceTrait>>,
    JsonBody(input): JsonBody<RefreshInput>,
) -> AppResult<Response> {
    let token = input.token().ok_or_else(AppError::refresh_token_missing)?;

    let access_token = auth_service
        .refresh(token)
        .await
        .map_err(|e| match e {
            AppError::TokenRejectedError(_) => AppError::refresh_token_invalid(),
            other => other,
        })?;

    Ok(ApiResponse::ok(
        messages::ACCESS_TOKEN_REFRESHED,
        AccessTokenResponse { access_token },
    )
    .with_status(StatusCode::OK))
}

pub async fn logout(
    Extension(auth_service): Extension<Arc<dyn AuthServiceTrait>>,
    JsonBody(input): JsonBody<RefreshInput>,
) -> AppResult<Response> {
    let token = input
        .token()
        .ok_or_else(|| AppError::validation(messages::REFRESH_TOKEN_MISSING))?;

    auth_service
        .logout(token)
        .await
        .map_err(|e| e.with_internal_message(messages::LOGOUT_ERROR))?;

    Ok(ApiResponse::ok(messages::USER_LOGGED_OUT, json!({})).with_status(StatusCode::OK))
}

pub async fn get_user(
    Extension(auth_service): Extension<Arc<dyn AuthServiceTrait>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Response> {
    let user = auth_service.get_user_by_id(&caller.user_id).await?;
    Ok(ApiResponse::ok(messages::USER_DATA_FETCHED, json!({ "user": user }))
        .with_status(StatusCode::OK))
}

pub async fn complete_profile(
    Extension(auth_service): Extension<Arc<dyn AuthServiceTrait>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Response> {
    let user = auth_service.complete_profile(&caller.user_id).await?;
    Ok(
        ApiResponse::ok(messages::PROFILE_COMPLETION_UPDATED, json!({ "user": user }))
            .with_status(StatusCode::OK),
    )
}
