//! User entries, dual-keyed by id and by username.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;

use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheError, CacheManager, CacheValue};
use crate::error::AppResult;
use crate::models::User;
use crate::services::cache::{Entity, WriteEvent, apply_rules, keys};

/// Result of a batch lookup. Missing ids are not an error at this level.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleUsers {
    /// In request order.
    pub found: Vec<User>,
    pub missing_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct UserCacheService {
    cache: CacheManager,
}

impl UserCacheService {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, CacheError> {
        self.cache.get_record(&keys::user_by_id(id)).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, CacheError> {
        self.cache
            .get_record(&keys::user_by_username(username))
            .await
    }

    /// Write `user` under both of its keys.
    pub async fn store(&self, user: &User) -> Result<(), CacheError> {
        self.cache
            .mset(Self::entries(std::slice::from_ref(user)), None)
            .await
    }

    /// Batch read-through.
    ///
    /// Cached users are served as-is; only the ids missing from the cache are
    /// passed to `fetch_missing`, and only what it returns is written back.
    /// Ids that neither the cache nor the store know end up in `missing_ids`.
    pub async fn get_many<F, Fut>(&self, ids: &[Uuid], fetch_missing: F) -> AppResult<MultipleUsers>
    where
        F: FnOnce(Vec<Uuid>) -> Fut,
        Fut: Future<Output = AppResult<Vec<User>>>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ids.is_empty() {
            return Ok(MultipleUsers {
                found: Vec::new(),
                missing_ids: Vec::new(),
            });
        }

        let cache_keys: Vec<String> = ids.iter().map(|id| keys::user_by_id(*id)).collect();
        let cached = self.cache.mget_records::<User>(&cache_keys).await?;

        let mut resolved: HashMap<Uuid, User> = HashMap::with_capacity(ids.len());
        let mut uncached = Vec::new();
        for (id, user) in ids.iter().zip(cached) {
            match user {
                Some(user) => {
                    resolved.insert(*id, user);
                }
                None => uncached.push(*id),
            }
        }
        debug!(
            requested = ids.len(),
            hits = resolved.len(),
            "user batch lookup"
        );

        if !uncached.is_empty() {
            let fetched = fetch_missing(uncached).await?;
            self.cache.mset(Self::entries(&fetched), None).await?;
            resolved.extend(fetched.into_iter().map(|user| (user.id, user)));
        }

        let mut found = Vec::with_capacity(resolved.len());
        let mut missing_ids = Vec::new();
        for id in ids {
            match resolved.remove(&id) {
                Some(user) => found.push(user),
                None => missing_ids.push(id),
            }
        }
        Ok(MultipleUsers { found, missing_ids })
    }

    pub async fn get_page(&self, offset: i64, limit: i64) -> Result<Option<Vec<User>>, CacheError> {
        self.cache
            .get_records(&keys::user_page(offset, limit))
            .await
    }

    /// Cache one page. Empty pages are not cached.
    pub async fn set_page(&self, offset: i64, limit: i64, users: &[User]) -> Result<(), CacheError> {
        if users.is_empty() {
            return Ok(());
        }
        self.cache
            .set(
                &keys::user_page(offset, limit),
                &CacheValue::records(users.iter().cloned()),
                None,
            )
            .await
    }

    pub async fn invalidate_on_create(&self) -> Result<(), CacheError> {
        apply_rules(&self.cache, Entity::User, WriteEvent::Created, None).await?;
        Ok(())
    }

    /// Refresh both keys, drop the entry under the previous username if it
    /// changed, then drop the pages.
    pub async fn invalidate_on_update(
        &self,
        user: &User,
        previous_username: &str,
    ) -> Result<(), CacheError> {
        self.store(user).await?;
        if previous_username != user.username {
            self.cache
                .delete(&[keys::user_by_username(previous_username)])
                .await?;
        }
        apply_rules(&self.cache, Entity::User, WriteEvent::Updated, None).await?;
        Ok(())
    }

    pub async fn invalidate_on_delete(&self, user: &User) -> Result<(), CacheError> {
        self.cache
            .delete(&[
                keys::user_by_id(user.id),
                keys::user_by_username(&user.username),
            ])
            .await?;
        apply_rules(&self.cache, Entity::User, WriteEvent::Deleted, None).await?;
        Ok(())
    }

    fn entries(users: &[User]) -> BTreeMap<String, CacheValue> {
        users
            .iter()
            .flat_map(|user| {
                [
                    (keys::user_by_id(user.id), CacheValue::record(user.clone())),
                    (
                        keys::user_by_username(&user.username),
                        CacheValue::record(user.clone()),
                    ),
                ]
            })
            .collect()
    }
}
