use crate::{
    handlers::{
        auth::{complete_profile, get_user, login, logout, refresh, register},
        health::health_check,
        not_found,
        profile::{create_profile, get_profile, update_profile},
    },
    service::{AuthServiceTrait, ProfileServiceTrait},
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use axum::{
    Router,
    extract::Extension,
    middleware,
    routing::{get, post, put},
};

use app_config::{AppConfig, CorsConfig};
use app_error::middleware_handling::error_handling_middleware;
use app_middleware::api_middleware::{
    logging_middleware, require_auth, security_headers_middleware,
};

fn cors_layer(cors_config: &CorsConfig) -> CorsLayer {
    let origin = if cors_config.allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(
            cors_config
                .allowed_methods
                .iter()
                .filter_map(|method| method.parse().ok())
                .collect::<Vec<_>>(),
        )
        .allow_headers(
            cors_config
                .allowed_headers
                .iter()
                .filter_map(|header| header.parse().ok())
                .collect::<Vec<_>>(),
        )
}

pub fn create_routes(
    config: &AppConfig,
    auth_service: Arc<dyn AuthServiceTrait>,
    profile_service: Arc<dyn ProfileServiceTrait>,
) -> Router {
    let jwt_service = auth_service.get_jwt_service();

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout));

    let protected = Router::new()
        .route("/api/auth/user", get(get_user))
        .route("/api/auth/profile-completion", put(complete_profile))
        .route(
            "/api/profile",
            post(create_profile).get(get_profile).put(update_profile),
        )
        .route_layer(middleware::from_fn_with_state(jwt_service, require_auth));

    let app = Router::new()
        .merge(public)
        .merge(protected)
        .fallback(not_found)
        .layer(Extension(auth_service))
        .layer(Extension(profile_service));

    // Framework errors from these layers are rewritten by the error middleware
    let app = app
        .layer(RequestBodyLimitLayer::new(config.server.body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(error_handling_middleware));

    let app = app
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(security_headers_middleware));

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(cors_layer(&config.security.cors)),
    )
}
