//! Cache-aside primitives over a [`KeyValueStore`] and a [`CacheSerializer`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::TryStreamExt;
use tracing::debug;

use crate::cache::keys::InvalidationPattern;
use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::serializer::{CacheSerializer, JsonSerializer};
use crate::cache::value::{CacheRecord, CacheValue};
use crate::cache::{CacheError, KeyValueStore, MAX_TTL_SECONDS};
use crate::config::settings::{CacheBackend, CacheConfig};

/// Encodes on the way in, decodes on the way out, and owns the default TTL.
///
/// The manager only knows "present" and "absent". Deciding that an absent
/// entity is an error belongs to the caller.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    serializer: Arc<dyn CacheSerializer>,
    default_ttl: u64,
}

impl CacheManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        serializer: Arc<dyn CacheSerializer>,
        default_ttl: u64,
    ) -> Self {
        Self {
            store,
            serializer,
            default_ttl,
        }
    }

    /// Build the configured backend with the JSON serializer.
    pub async fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn KeyValueStore> = match config.backend {
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
            CacheBackend::Redis => Arc::new(RedisStore::new(&config.redis).await?),
        };
        Ok(Self::new(
            store,
            Arc::new(JsonSerializer::new()),
            config.default_ttl_seconds,
        ))
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn ttl_or_default(&self, ttl_seconds: Option<u64>) -> Result<Option<u64>, CacheError> {
        match ttl_seconds.unwrap_or(self.default_ttl) {
            ttl @ 1..=MAX_TTL_SECONDS => Ok(Some(ttl)),
            ttl => Err(CacheError::Operation(format!(
                "invalid expire time: {ttl}s (allowed 1..={MAX_TTL_SECONDS})"
            ))),
        }
    }

    /// Decoded value, or `None` on miss or after expiry.
    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let raw = self.store.get(key).await?;
        debug!(key, hit = raw.is_some(), "cache get");
        raw.map(|raw| self.serializer.decode(&raw)).transpose()
    }

    /// Overwrite `key`, resetting its TTL. `None` uses the default TTL.
    pub async fn set(
        &self,
        key: &str,
        value: &CacheValue,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let ttl = self.ttl_or_default(ttl_seconds)?;
        let encoded = self.serializer.encode(value)?;
        self.store.set(key, encoded, ttl).await?;
        debug!(key, "cache set");
        Ok(())
    }

    /// Values positionally aligned with `keys`.
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<CacheValue>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let raws = self.store.mget(keys).await?;
        if raws.len() != keys.len() {
            return Err(CacheError::Operation(format!(
                "MGET returned {} values for {} keys",
                raws.len(),
                keys.len()
            )));
        }
        debug!(
            keys = keys.len(),
            hits = raws.iter().filter(|raw| raw.is_some()).count(),
            "cache mget"
        );
        raws.into_iter()
            .map(|raw| raw.map(|raw| self.serializer.decode(&raw)).transpose())
            .collect()
    }

    /// Set every entry with the same TTL in one batch. Empty input is a no-op.
    pub async fn mset(
        &self,
        entries: BTreeMap<String, CacheValue>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }
        let ttl = self.ttl_or_default(ttl_seconds)?;
        let encoded = entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.serializer.encode(value)?)))
            .collect::<Result<Vec<_>, CacheError>>()?;
        let count = encoded.len();
        self.store.mset(encoded, ttl).await?;
        debug!(entries = count, "cache mset");
        Ok(())
    }

    /// Remove keys, returning how many existed. Empty input is a no-op.
    pub async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let deleted = self.store.delete(keys).await?;
        debug!(keys = keys.len(), deleted, "cache delete");
        Ok(deleted)
    }

    /// Delete the union of keys matching any pattern with a single delete call.
    ///
    /// When nothing matches the store is not asked to delete at all.
    pub async fn delete_pattern(
        &self,
        patterns: &[InvalidationPattern],
    ) -> Result<u64, CacheError> {
        let mut matched = BTreeSet::new();
        for pattern in patterns {
            let keys: Vec<String> = self.store.scan(pattern.as_str()).try_collect().await?;
            matched.extend(keys);
        }

        if matched.is_empty() {
            debug!(?patterns, "cache invalidate: nothing matched");
            return Ok(0);
        }

        let keys: Vec<String> = matched.into_iter().collect();
        let deleted = self.store.delete(&keys).await?;
        debug!(?patterns, matched = keys.len(), deleted, "cache invalidate");
        Ok(deleted)
    }

    /// Read one record of type `T`.
    ///
    /// A hit that decodes to anything else is a [`CacheError::Type`].
    pub async fn get_record<T: CacheRecord>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(value) => value.into_record().map(Some).ok_or_else(|| CacheError::Type {
                key: key.to_string(),
                expected: T::TYPE_TAG,
            }),
            None => Ok(None),
        }
    }

    /// Read a list of records of type `T`.
    pub async fn get_records<T: CacheRecord>(
        &self,
        key: &str,
    ) -> Result<Option<Vec<T>>, CacheError> {
        match self.get(key).await? {
            Some(value) => value.into_records().map(Some).ok_or_else(|| CacheError::Type {
                key: key.to_string(),
                expected: T::TYPE_TAG,
            }),
            None => Ok(None),
        }
    }

    /// Batch read of single records, aligned with `keys`.
    pub async fn mget_records<T: CacheRecord>(
        &self,
        keys: &[String],
    ) -> Result<Vec<Option<T>>, CacheError> {
        self.mget(keys)
            .await?
            .into_iter()
            .zip(keys)
            .map(|(value, key)| match value {
                Some(value) => value.into_record().map(Some).ok_or_else(|| CacheError::Type {
                    key: key.clone(),
                    expected: T::TYPE_TAG,
                }),
                None => Ok(None),
            })
            .collect()
    }
}
