
use app_config::{AppConfig, JwtConfig};
use app_database::MemoryStore;
use std::sync::Arc;

use crate::service::{AuthService, ProfileService};

pub(crate) fn jwt_config() -> JwtConfig {
    JwtConfig::new(b"test_access_secret", b"test_refresh_secret")
}

pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<AuthService>,
    pub profiles: Arc<ProfileService>,
}

pub(crate) fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(AuthService::new(&jwt_config()).with_store(store.clone()));
    let profiles = Arc::new(ProfileService::new(store.clone(), store.clone()));

    Harness {
        store,
        auth,
        profiles,
    }
}

pub(crate) fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.body_limit = 16 * 1024;
    config
}
