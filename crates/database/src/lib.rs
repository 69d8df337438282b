pub mod db_connect;
pub mod memory;
pub mod schema;
pub mod service;
pub mod store;
pub mod surreal_store;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use surrealdb::{Surreal, engine::any::Any};

pub use memory::MemoryStore;
pub use service::{DbCredentials, DbService};
pub use store::{CreateOutcome, ProfileStore, TokenStore, UpdateOutcome, UserStore};
pub use surreal_store::SurrealStore;

/// What every fresh connection runs before it is handed out.
#[derive(Debug, Clone)]
pub struct ConnectionSetup {
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DbCredentials>,
}

pub struct ConnectionPool {
    pub connection_url: String,
    pub connections: Arc<Mutex<Vec<Surreal<Any>>>>,
    pub max_size: usize,
    pub connect_timeout: Duration,
    setup: Option<ConnectionSetup>,
    // In-memory engines are per connection, so every handle clones this one.
    seed: Option<Surreal<Any>>,
}

pub struct Database {
    pub pool: ConnectionPool,
}

// A wrapper for a connection that returns it to the pool when dropped
pub struct PooledConnection<'a> {
    conn: Surreal<Any>,
    pool: &'a ConnectionPool,
}

impl PooledConnection<'_> {
    pub fn get_ref(&self) -> &Surreal<Any> {
        &self.conn
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        self.pool.return_connection(self.conn.clone());
    }
}
