//! Redis store implementation using bb8 connection pool.

use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

use crate::cache::{CacheError, KeyValueStore};
use crate::config::settings::RedisCacheConfig;

type RedisPool = Pool<Client>;

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 500;

/// Redis-backed key/value store with bb8 connection pool.
pub struct RedisStore {
    pool: RedisPool,
}

impl RedisStore {
    pub async fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    async fn get_conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }

    /// One SCAN step. Returns the keys of this page and the next cursor,
    /// `None` once the server reports cursor 0.
    async fn scan_page(
        &self,
        pattern: &str,
        cursor: u64,
    ) -> Result<(Vec<String>, Option<u64>), CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;

        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_BATCH)
            .query_async(conn_ref)
            .await?;

        Ok((keys, (next != 0).then_some(next)))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        Ok(conn_ref.get(key).await?)
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;

        match ttl_seconds {
            Some(ttl) => conn_ref.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn_ref.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(conn_ref)
            .await?;
        Ok(values)
    }

    async fn mset(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        if entries.is_empty() {
            return Ok(());
        }

        // MSET cannot carry a TTL, so the batch is a MULTI/EXEC of SET commands.
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            match ttl_seconds {
                Some(ttl) => pipe.set_ex(key, value, ttl).ignore(),
                None => pipe.set(key, value).ignore(),
            };
        }

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        pipe.query_async::<()>(conn_ref).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        Ok(conn_ref.del(keys).await?)
    }

    fn scan<'a>(&'a self, pattern: &'a str) -> BoxStream<'a, Result<String, CacheError>> {
        stream::try_unfold(Some(0u64), move |cursor| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };
            let (keys, next) = self.scan_page(pattern, cursor).await?;
            let page = stream::iter(keys.into_iter().map(Ok::<_, CacheError>));
            Ok::<_, CacheError>(Some((page, next)))
        })
        .try_flatten()
        .boxed()
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.get_conn().await?;
        let conn_ref: &mut MultiplexedConnection = &mut conn;
        redis::cmd("PING").query_async::<String>(conn_ref).await?;
        Ok(())
    }
}
