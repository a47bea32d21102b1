//! Cache-aside layer.
//!
//! - [`KeyValueStore`]: string store with TTL and glob scan (Redis or in-memory)
//! - [`JsonSerializer`]: typed encoding so identifiers and records survive the trip
//! - [`CacheManager`]: get/set, batch get/set, delete, pattern delete
//! - [`keys`]: deterministic key construction and invalidation patterns
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"  # or "memory"
//! default_ttl_seconds = 3600
//!
//! [cache.redis]
//! url = "redis://127.0.0.1:6379"
//! pool_size = 8
//! connection_timeout = 5
//! ```

mod error;
pub mod keys;
mod manager;
mod memory;
mod records;
mod redis;
pub mod serializer;
#[cfg(test)]
pub(crate) mod testing;
mod traits;
pub mod value;

pub use error::CacheError;
pub use keys::{CacheKey, InvalidationPattern};
pub use manager::CacheManager;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use serializer::{CacheSerializer, JsonSerializer};
pub use traits::{KeyValueStore, MAX_TTL_SECONDS};
pub use value::{CacheRecord, CacheValue, Record};

// Re-export config types
pub use crate::config::settings::{CacheBackend, CacheConfig, RedisCacheConfig};
