//! Helpers for driving the assembled router end to end.

use app_config::{AppConfig, JwtConfig};
use app_database::{MemoryStore, SurrealStore, db_connect::initialize_memory_db};
use app_error::AppResult;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use micro_user::{
    routes::create_routes,
    service::{AuthService, ProfileService},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub jwt_config: JwtConfig,
}

fn test_jwt_config() -> JwtConfig {
    JwtConfig::new(
        b"system_test_access_secret_value",
        b"system_test_refresh_secret_value",
    )
}

impl TestApp {
    /// Router backed by an embedded SurrealDB instance, schema applied.
    pub async fn with_surreal() -> AppResult<Self> {
        let db = initialize_memory_db().await?;
        let store = Arc::new(SurrealStore::new(db));
        Ok(Self::build(store))
    }

    /// Router backed by the in-process store.
    pub fn with_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(store)
    }

    fn build<S>(store: Arc<S>) -> Self
    where
        S: app_database::UserStore
            + app_database::TokenStore
            + app_database::ProfileStore
            + 'static,
    {
        let jwt_config = test_jwt_config();
        let auth_service = Arc::new(AuthService::new(&jwt_config).with_store(store.clone()));
        let profile_service = Arc::new(ProfileService::new(store.clone(), store));
        let router = create_routes(&AppConfig::default(), auth_service, profile_service);

        Self { router, jwt_config }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("readable body");

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }
}
