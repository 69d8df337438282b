use app_error::{AppError, AppResult, messages};
use app_middleware::AuthenticatedUser;
use app_models::ProfileInput;
use axum::{Extension, http::StatusCode, response::Response};
use serde_json::json;
use std::sync::Arc;

use super::{ApiResponse, JsonBody};
use crate::service::ProfileServiceTrait;

pub async fn create_profile(
    Extension(profile_service): Extension<Arc<dyn ProfileServiceTrait>>,
    Extension(caller): Extension<AuthenticatedUser>,
    JsonBody(input): JsonBody<ProfileInput>,
) -> AppResult<Response> {
    let profile = profile_service.create(&caller.user_id, input).await?;
    Ok(
        ApiResponse::ok(messages::PROFILE_CREATED, json!({ "profile": profile }))
            .with_status(StatusCode::CREATED),
    )
}

pub async fn get_profile(
    Extension(profile_service): Extension<Arc<dyn ProfileServiceTrait>>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> AppResult<Response> {
    let profile = profile_service
        .get(&caller.user_id)
        .await?
        .ok_or_else(AppError::profile_not_found)?;

    Ok(
        ApiResponse::ok(messages::PROFILE_FETCHED, json!({ "profile": profile }))
            .with_status(StatusCode::OK),
    )
}

pub async fn update_profile(
    Extension(profile_service): Extension<Arc<dyn ProfileServiceTrait>>,
    Extension(caller): Extension<AuthenticatedUser>,
    JsonBody(input): JsonBody<ProfileInput>,
) -> AppResult<Response> {
    let profile = profile_service.update(&caller.user_id, input).await?;
    Ok(
        ApiResponse::ok(messages::PROFILE_UPDATED, json!({ "profile": profile }))
            .with_status(StatusCode::OK),
    )
}
