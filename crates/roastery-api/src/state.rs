//! Application state management

use roastery_core::config::AppConfig;
use roastery_core::{Catalog, ConfigError, PgStore, UserStore};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{AuthService, TokenIssuer};
use crate::services::CatalogService;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Authentication service
    pub auth: AuthService,
    /// Catalog service
    pub catalog: CatalogService,
    /// Credential store shared with the auth service
    pub users: Arc<dyn UserStore>,
    /// PostgreSQL store, when configured
    pub db: Option<Arc<PgStore>>,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
}

impl AppState {
    /// Create state over explicit store handles
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        catalog: Catalog,
        db: Option<Arc<PgStore>>,
    ) -> Result<Self, ConfigError> {
        let tokens = TokenIssuer::new(&config.auth)?;

        Ok(Self {
            auth: AuthService::new(users.clone(), tokens),
            users,
            catalog: CatalogService::new(catalog),
            config,
            db,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
        })
    }

    /// State backed entirely by process memory
    pub fn in_memory(config: AppConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            roastery_core::store::in_memory_users(),
            Catalog::in_memory(),
            None,
        )
    }

    /// State backed by PostgreSQL
    pub fn postgres(config: AppConfig, store: Arc<PgStore>) -> Result<Self, ConfigError> {
        Self::new(
            config,
            store.clone(),
            Catalog::postgres(store.clone()),
            Some(store),
        )
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }

    /// Ping the database, if there is one
    pub async fn database_healthy(&self) -> bool {
        match &self.db {
            Some(store) => sqlx::query("SELECT 1").execute(store.pool()).await.is_ok(),
            None => true,
        }
    }
}
