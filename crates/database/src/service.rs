use crate::{ConnectionPool, ConnectionSetup, Database, PooledConnection};

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{marker::PhantomData, sync::Mutex, time::Duration};
use surrealdb::{Surreal, engine::any::Any, opt::auth::Root};
use tokio::time::timeout;

use app_error::{AppError, AppErrorExt, AppResult};

lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

pub const MEMORY_ENDPOINT: &str = "memory";

impl ConnectionPool {
    pub fn new(connection_url: &str, max_size: usize) -> Self {
        Self {
            connection_url: connection_url.to_string(),
            connections: Mutex::new(Vec::with_capacity(max_size)).into(),
            max_size,
            connect_timeout: Duration::from_secs(5),
            setup: None,
            seed: None,
        }
    }

    pub fn with_setup(mut self, setup: ConnectionSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn is_memory(&self) -> bool {
        self.connection_url.starts_with(MEMORY_ENDPOINT)
    }

    /// Get a connection from the pool or create a new one if needed.
    /// Pooled connections are health-checked before reuse.
    pub async fn get_connection(&self) -> AppResult<PooledConnection> {
        let conn_opt: Option<Surreal<Any>> = {
            let mut connections = self.connections.lock().map_err(|e| {
                AppError::ServerError(anyhow::anyhow!(
                    "Failed to lock connection pool mutex: {}",
                    e
                ))
            })?;
            connections.pop()
        };

        if let Some(conn) = conn_opt {
            match timeout(Duration::from_secs(2), conn.health()).await {
                Ok(Ok(_)) => {
                    return Ok(PooledConnection { conn, pool: self });
                }
                _ => {
                    tracing::debug!("Discarding invalid connection from pool");
                }
            }
        }

        if let Some(seed) = &self.seed {
            return Ok(PooledConnection {
                conn: seed.clone(),
                pool: self,
            });
        }

        let conn = self.open().await?;
        Ok(PooledConnection { conn, pool: self })
    }

    async fn open(&self) -> AppResult<Surreal<Any>> {
        let conn_future = surrealdb::engine::any::connect(&self.connection_url);
        let conn = match timeout(self.connect_timeout, conn_future).await {
            Ok(conn_result) => conn_result
                .context("Failed to connect to database")
                .db_err()?,
            Err(_) => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Database connection timeout - could not establish connection within {:?}",
                    self.connect_timeout
                )));
            }
        };

        if let Some(setup) = &self.setup {
            prepare_connection(&conn, setup).await?;
        }

        Ok(conn)
    }

    pub fn return_connection(&self, conn: Surreal<Any>) {
        if let Ok(mut connections) = self.connections.lock() {
            if connections.len() < self.max_size {
                connections.push(conn);
            }
        }
        // A full or poisoned pool drops the connection
    }
}

async fn prepare_connection(conn: &Surreal<Any>, setup: &ConnectionSetup) -> AppResult<()> {
    if let Some(credentials) = &setup.credentials {
        conn.signin(Root {
            username: credentials.get_username(),
            password: credentials.get_password(),
        })
        .await
        .context("Failed to authenticate with database")
        .db_err()?;
    }

    conn.use_ns(&setup.namespace)
        .use_db(&setup.database)
        .await
        .context("Failed to select namespace and database")
        .db_err()?;

    Ok(())
}

#[derive(Clone)]
pub struct DbCredentials {
    username: String,
    password: String,
}

impl DbCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }
}

// Don't accidentally log credentials
impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Database {
    pub fn new(connection_url: &str, max_connections: usize) -> Self {
        if !connection_url.starts_with("ws://")
            && !connection_url.starts_with("wss://")
            && !connection_url.starts_with(MEMORY_ENDPOINT)
        {
            tracing::warn!(
                "Potentially invalid database connection URL format: {}",
                connection_url
            );
        }

        let pool = ConnectionPool::new(connection_url, max_connections);
        Self { pool }
    }

    pub async fn get_connection(&self) -> AppResult<PooledConnection> {
        self.pool.get_connection().await
    }

    pub async fn initialize(
        connection_url: &str,
        max_connections: usize,
        namespace: &str,
        database: &str,
        credentials: &DbCredentials,
    ) -> AppResult<Self> {
        if namespace.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Database namespace cannot be empty".into(),
            ));
        }

        if database.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Database name cannot be empty".into(),
            ));
        }

        let setup = ConnectionSetup {
            namespace: namespace.to_string(),
            database: database.to_string(),
            credentials: Some(credentials.clone()),
        };

        if connection_url.starts_with(MEMORY_ENDPOINT) {
            // The embedded engine starts without users, so no signin
            return Self::initialize_memory_db(max_connections, namespace, database).await;
        }

        let db = Self {
            pool: Self::new(connection_url, max_connections).pool.with_setup(setup),
        };

        // Fail fast on bad credentials instead of on the first request
        drop(db.get_connection().await?);

        Ok(db)
    }

    pub async fn initialize_memory_db(
        max_connections: usize,
        namespace: &str,
        database: &str,
    ) -> AppResult<Self> {
        let mut pool = ConnectionPool::new(MEMORY_ENDPOINT, max_connections).with_setup(
            ConnectionSetup {
                namespace: namespace.to_string(),
                database: database.to_string(),
                credentials: None,
            },
        );

        let seed = pool.open().await?;
        pool.seed = Some(seed);

        Ok(Self { pool })
    }

    pub async fn create<T>(&self, location: (&str, &str), data: T) -> AppResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .create((location.0, location.1))
            .content(data)
            .await
            .context("Failed to create record")
            .db_err()
    }

    pub async fn update<T>(&self, location: (&str, &str), data: T) -> AppResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .update((location.0, location.1))
            .content(data)
            .await
            .context("Failed to update record")
            .db_err()
    }

    pub async fn delete<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .delete((location.0, location.1))
            .await
            .context("Failed to delete record")
            .db_err()
    }

    pub async fn select<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .select((location.0, location.1))
            .await
            .context("Failed to select record")
            .db_err()
    }

    pub fn query(&self, sql: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder {
            pool: &self.pool,
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

pub struct QueryBuilder<'a> {
    pool: &'a ConnectionPool,
    sql: String,
    bindings: Vec<(String, serde_json::Value)>,
}

impl QueryBuilder<'_> {
    pub fn bind(mut self, binding: (impl Into<String>, impl Into<serde_json::Value>)) -> Self {
        self.bindings.push((binding.0.into(), binding.1.into()));
        self
    }

    pub async fn r#await(self) -> AppResult<QueryResponse> {
        let conn = self.pool.get_connection().await?;
        let mut query = conn.get_ref().query(&self.sql);

        for (name, value) in self.bindings {
            query = query.bind((name, value));
        }

        let response = query.await.context("Failed to execute query").db_err()?;
        Ok(QueryResponse(response))
    }
}

pub struct QueryResponse(surrealdb::Response);

impl QueryResponse {
    /// Surfaces the first statement error, if any
    pub fn check(self) -> AppResult<Self> {
        self.0
            .check()
            .map(QueryResponse)
            .context("Query statement failed")
            .db_err()
    }

    pub fn take<T>(mut self, index: usize) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.0
            .take(index)
            .context("Failed to extract query results")
            .db_err()
    }
}

/// Table-scoped CRUD over records keyed by a caller-chosen id.
pub struct DbService<'a, T> {
    db: &'a Database,
    table_name: String,
    _phantom: PhantomData<T>,
}

impl<'a, T> DbService<'a, T>
where
    T: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
    pub fn new(db: &'a Database, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    // Generic DB operation wrapper with consistent error handling and logging
    async fn execute_db_operation<F, R>(&self, operation: &str, execute: F) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>>,
    {
        execute.await.map_err(|e| {
            if let AppError::DatabaseError(err) = e {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to {} {} record: {:#}",
                    operation,
                    self.table_name,
                    err
                ))
            } else {
                e
            }
        })
    }

    pub async fn create_record(&self, record_id: &str, item: T) -> AppResult<Option<T>> {
        self.execute_db_operation("create", async {
            self.db.create((&self.table_name, record_id), item).await
        })
        .await
    }

    pub async fn update_record(&self, record_id: &str, updated_data: T) -> AppResult<Option<T>> {
        self.execute_db_operation("update", async {
            self.db.update((&self.table_name, record_id), updated_data).await
        })
        .await
    }

    pub async fn delete_record(&self, record_id: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("delete", async {
            self.db.delete((&self.table_name, record_id)).await
        })
        .await
    }

    pub async fn get_record_by_id(&self, record_id: &str) -> AppResult<Option<T>> {
        self.execute_db_operation("fetch", async {
            self.db.select((&self.table_name, record_id)).await
        })
        .await
    }

    // Identifiers are interpolated into SQL, values never are
    fn validate_identifier(&self, identifier: &str) -> AppResult<()> {
        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(AppError::ValidationError(format!(
                "Invalid identifier '{}': must start with a letter or underscore and contain only alphanumeric characters and underscores",
                identifier
            )));
        }

        Ok(())
    }

    pub async fn get_records_by_field<V>(&self, field: &str, value: V) -> AppResult<Vec<T>>
    where
        V: Serialize + Send + Sync + 'static,
    {
        self.validate_identifier(field)?;
        self.validate_identifier(&self.table_name)?;

        let sql = format!("SELECT * FROM {} WHERE {} = $value", self.table_name, field);

        let value_json = serde_json::to_value(value).map_err(|e| {
            AppError::ValidationError(format!(
                "Failed to serialize value for field '{}': {}",
                field, e
            ))
        })?;

        self.execute_db_operation("query", async {
            let response = self.db.query(&sql).bind(("value", value_json)).r#await().await?;

            response.take(0)
        })
        .await
    }
}
