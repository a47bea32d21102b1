//! Shared application state.
//!
//! Owns the connection pool, the cache manager and the services built on
//! them. Cloning is cheap: pools and services are reference counted.

use std::sync::Arc;

use tracing::info;

use crate::cache::CacheManager;
use crate::config::Settings;
use crate::db::{AsyncDbPool, check_connection, establish_async_connection_pool};
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub services: Services,
    pub cache: CacheManager,
    /// Direct access to the database connection pool
    pub db_pool: AsyncDbPool,
}

impl AppState {
    /// Connect to the database and the configured cache backend.
    pub async fn new(settings: Settings) -> AppResult<Self> {
        let db_pool = establish_async_connection_pool(&settings.database).await?;
        let cache = CacheManager::from_config(&settings.cache).await?;
        info!(
            backend = settings.cache.backend.as_str(),
            default_ttl = cache.default_ttl(),
            "Cache manager ready"
        );

        let services = Services::new(Repositories::new(db_pool.clone()), cache.clone());
        Ok(Self {
            settings: Arc::new(settings),
            services,
            cache,
            db_pool,
        })
    }

    pub async fn check_database(&self) -> AppResult<()> {
        check_connection(&self.db_pool).await
    }

    pub async fn check_cache(&self) -> AppResult<()> {
        self.cache.store().ping().await?;
        Ok(())
    }
}
