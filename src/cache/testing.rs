//! Test doubles for the cache layer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::cache::memory::MemoryStore;
use crate::cache::serializer::JsonSerializer;
use crate::cache::{CacheError, CacheManager, KeyValueStore};

pub(crate) const TEST_TTL: u64 = 3600;

/// A [`MemoryStore`] that records every call made through the trait.
#[derive(Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<&'static str>>,
    ttls: Mutex<Vec<Option<u64>>>,
    failure: Mutex<Option<String>>,
}

impl RecordingStore {
    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// How many times `op` was called.
    pub(crate) fn calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == op)
            .count()
    }

    pub(crate) fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// TTLs passed to `set` and `mset`, in call order.
    pub(crate) fn ttls(&self) -> Vec<Option<u64>> {
        self.ttls.lock().unwrap().clone()
    }

    /// Make the next call fail with a connection error.
    pub(crate) fn fail_next(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn record(&self, op: &'static str) -> Result<(), CacheError> {
        self.calls.lock().unwrap().push(op);
        match self.failure.lock().unwrap().take() {
            Some(message) => Err(CacheError::Connection(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.record("get")?;
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        self.record("set")?;
        self.ttls.lock().unwrap().push(ttl_seconds);
        self.inner.set(key, value, ttl_seconds).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        self.record("mget")?;
        self.inner.mget(keys).await
    }

    async fn mset(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        self.record("mset")?;
        self.ttls.lock().unwrap().push(ttl_seconds);
        self.inner.mset(entries, ttl_seconds).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        self.record("delete")?;
        self.inner.delete(keys).await
    }

    fn scan<'a>(&'a self, pattern: &'a str) -> BoxStream<'a, Result<String, CacheError>> {
        match self.record("scan") {
            Ok(()) => self.inner.scan(pattern),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.record("ping")
    }
}

/// A manager over `store` with the JSON serializer and [`TEST_TTL`].
pub(crate) fn manager_over(store: RecordingStore) -> (CacheManager, Arc<RecordingStore>) {
    let store = Arc::new(store);
    let manager = CacheManager::new(store.clone(), Arc::new(JsonSerializer::new()), TEST_TTL);
    (manager, store)
}
