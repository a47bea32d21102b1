//! Cache command handlers
//!
//! Work directly on the cache manager; no database connection is opened.

use tracing::info;

use crate::cache::{CacheManager, InvalidationPattern};
use crate::cli::parser::Namespace;
use crate::config::settings::Settings;
use crate::error::AppResult;

pub struct CacheCommandHandler {
    cache: CacheManager,
}

impl CacheCommandHandler {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    pub async fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::new(CacheManager::from_config(&settings.cache).await?))
    }

    /// Decoded value under `key`, or `None` when absent.
    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value = self.cache.get(key).await?;
        Ok(value.map(|value| format!("{value:#?}")))
    }

    /// Drop every entry of `namespaces` in one pattern delete.
    pub async fn invalidate(&self, namespaces: &[Namespace]) -> AppResult<u64> {
        let patterns = Self::patterns(namespaces);
        let deleted = self.cache.delete_pattern(&patterns).await?;
        info!(?patterns, deleted, "Cache namespaces invalidated");
        Ok(deleted)
    }

    fn patterns(namespaces: &[Namespace]) -> Vec<InvalidationPattern> {
        let mut patterns: Vec<InvalidationPattern> = namespaces
            .iter()
            .map(|namespace| InvalidationPattern::namespace(namespace.as_str()))
            .collect();
        patterns.sort();
        patterns.dedup();
        patterns
    }
}
