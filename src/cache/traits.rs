//! KeyValueStore trait definition.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::cache::CacheError;

/// Largest TTL any backend accepts. Redis stores expiry as milliseconds in an `i64`.
pub const MAX_TTL_SECONDS: u64 = (i64::MAX / 1000) as u64;

/// A shared string key/value store with per-key expiry and glob scanning.
///
/// All backends must implement this trait so the [`CacheManager`](crate::cache::CacheManager)
/// can stay backend-agnostic. Values are already-encoded strings; the store
/// never interprets them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value. `None` on miss or after expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value, overwriting any previous entry and resetting its TTL.
    ///
    /// `ttl_seconds = None` stores the entry without expiry.
    async fn set(&self, key: &str, value: String, ttl_seconds: Option<u64>)
    -> Result<(), CacheError>;

    /// Get many values, positionally aligned with `keys`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError>;

    /// Set many values in one batch, applying the same TTL to every entry.
    async fn mset(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError>;

    /// Delete keys, returning how many were actually removed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Stream every key matching a glob pattern (`*`, `?`, `[...]`, `\\` escapes).
    fn scan<'a>(&'a self, pattern: &'a str) -> BoxStream<'a, Result<String, CacheError>>;

    /// Round-trip a no-op command to check the backend is reachable.
    async fn ping(&self) -> Result<(), CacheError>;
}
