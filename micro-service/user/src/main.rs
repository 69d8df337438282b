use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use app_config::{AppConfig, JwtConfig, LoggingConfig, SentryConfig, Server};
use app_database::{SurrealStore, db_connect::initialize_db};
use app_error::{AppError, AppErrorExt};
use micro_user::{
    routes,
    service::{AuthService, ProfileService},
};

fn init_sentry(sentry_config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    if sentry_config.dsn.trim().is_empty() {
        return None;
    }

    Some(sentry::init((
        sentry_config.dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(sentry_config.environment.clone().into()),
            sample_rate: sentry_config.sample_rate,
            traces_sample_rate: sentry_config.traces_sample_rate,
            ..Default::default()
        },
    )))
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .config_err()?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(sentry_tracing::layer());

    if logging.format == "json" {
        registry.with(fmt::layer().json()).try_init().server_err()
    } else {
        registry.with(fmt::layer()).try_init().server_err()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::load()?;

    // Sentry first so the tracing layer has a client to report to
    let _guard = init_sentry(&config.monitoring.sentry);
    init_tracing(&config.monitoring.logging)?;

    info!("Starting application at {}", chrono::Utc::now());

    let server = Server::from(&config);
    server.validate()?;
    let jwt_config = JwtConfig::from(&config);

    let db = initialize_db(&config.database).await?;
    let store = Arc::new(SurrealStore::new(db));

    let auth_service = Arc::new(AuthService::new(&jwt_config).with_store(store.clone()));
    let profile_service = Arc::new(ProfileService::new(store.clone(), store));

    let app = routes::create_routes(&config, auth_service, profile_service);

    let address = server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind to address: {}", address))?;

    info!("Server listening on http://{}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}
