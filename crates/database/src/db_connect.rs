use app_config::SurrealDbConfig;
use app_error::AppResult;
use std::{sync::Arc, time::Duration};

use crate::{Database, schema::apply_schema, service::DbCredentials};

fn log_endpoint(db_config: &SurrealDbConfig) {
    tracing::debug!("Connecting to SurrealDB: {}", db_config.endpoint);

    if db_config.endpoint.starts_with("wss://") {
        tracing::info!("Using secure TLS connection to database");
    } else if !db_config.endpoint.starts_with("memory") {
        tracing::warn!("Using non-secure database connection");
    }

    tracing::info!(
        "Initializing database connection pool with {} connections",
        db_config.pool.size
    );
}

/// Connects the pool described by `db_config` and applies the schema.
pub async fn initialize_db(db_config: &SurrealDbConfig) -> AppResult<Arc<Database>> {
    log_endpoint(db_config);

    let credentials = DbCredentials::new(&db_config.username, &db_config.password);

    let mut db = Database::initialize(
        &db_config.endpoint,
        db_config.pool.size,
        &db_config.namespace,
        &db_config.database,
        &credentials,
    )
    .await?;
    db.pool.connect_timeout = Duration::from_millis(db_config.pool.connection_timeout.max(100));

    apply_schema(&db).await?;

    tracing::info!("Successfully connected to SurrealDB with connection pool");

    Ok(Arc::new(db))
}

pub async fn initialize_memory_db() -> AppResult<Arc<Database>> {
    let db = Database::initialize_memory_db(10, "userDb", "profiles").await?;
    apply_schema(&db).await?;

    tracing::info!("Successfully connected to in-memory SurrealDB with connection pool");

    Ok(Arc::new(db))
}
