//! Entity cache services: read-through, batch reconciliation and
//! write invalidation on top of [`CacheManager`].
//!
//! All invalidation methods must be called after the store write has
//! committed. Cache failures are returned, never downgraded to a miss.

mod company_cache;
pub mod invalidation;
mod item_cache;
pub mod keys;
mod user_cache;

pub use company_cache::CompanyCacheService;
pub use invalidation::{Entity, InvalidationRule, WriteEvent};
pub use item_cache::ItemCacheService;
pub use user_cache::{MultipleUsers, UserCacheService};

use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheError, CacheManager};

/// Drop everything the rules list for `event` on `entity` in one call.
async fn apply_rules(
    cache: &CacheManager,
    entity: Entity,
    event: WriteEvent,
    company_id: Option<Uuid>,
) -> Result<u64, CacheError> {
    let patterns = invalidation::patterns_for(entity, event, company_id);
    let deleted = cache.delete_pattern(&patterns).await?;
    debug!(?entity, %event, ?patterns, deleted, "cache invalidated");
    Ok(deleted)
}
