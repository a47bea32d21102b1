//! Item detail, batch and listing entries.
//!
//! Batch and company listing entries are scoped under
//! `items:company_id=<c>`, so an item write only drops its own company's
//! aggregates plus the global pages.

use uuid::Uuid;

use crate::cache::{CacheError, CacheManager, CacheValue};
use crate::models::Item;
use crate::services::cache::{Entity, WriteEvent, apply_rules, keys};

#[derive(Clone)]
pub struct ItemCacheService {
    cache: CacheManager,
}

impl ItemCacheService {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    pub async fn get(&self, company_id: Uuid, item_id: Uuid) -> Result<Option<Item>, CacheError> {
        self.cache
            .get_record(&keys::item(company_id, item_id))
            .await
    }

    pub async fn store(&self, item: &Item) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::item(item.company_id, item.id),
                &CacheValue::record(item.clone()),
                None,
            )
            .await
    }

    /// The resolved set cached for exactly this set of ids, in any order.
    pub async fn get_batch(
        &self,
        company_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Option<Vec<Item>>, CacheError> {
        self.cache
            .get_records(&keys::item_batch(company_id, ids))
            .await
    }

    pub async fn set_batch(
        &self,
        company_id: Uuid,
        ids: &[Uuid],
        items: &[Item],
    ) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::item_batch(company_id, ids),
                &CacheValue::records(items.iter().cloned()),
                None,
            )
            .await
    }

    pub async fn get_company_listing(
        &self,
        company_id: Uuid,
    ) -> Result<Option<Vec<Item>>, CacheError> {
        self.cache
            .get_records(&keys::company_item_listing(company_id).into_string())
            .await
    }

    pub async fn set_company_listing(
        &self,
        company_id: Uuid,
        items: &[Item],
    ) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::company_item_listing(company_id).into_string(),
                &CacheValue::records(items.iter().cloned()),
                None,
            )
            .await
    }

    pub async fn get_page(&self, offset: i64, limit: i64) -> Result<Option<Vec<Item>>, CacheError> {
        self.cache
            .get_records(&keys::item_page(offset, limit))
            .await
    }

    pub async fn set_page(&self, offset: i64, limit: i64, items: &[Item]) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::item_page(offset, limit),
                &CacheValue::records(items.iter().cloned()),
                None,
            )
            .await
    }

    /// Listings only; no detail entry exists for a new item.
    pub async fn invalidate_on_create(&self, company_id: Uuid) -> Result<(), CacheError> {
        apply_rules(&self.cache, Entity::Item, WriteEvent::Created, Some(company_id)).await?;
        Ok(())
    }

    pub async fn invalidate_on_update(&self, item: &Item) -> Result<(), CacheError> {
        self.store(item).await?;
        apply_rules(
            &self.cache,
            Entity::Item,
            WriteEvent::Updated,
            Some(item.company_id),
        )
        .await?;
        Ok(())
    }

    pub async fn invalidate_on_delete(
        &self,
        company_id: Uuid,
        item_ids: &[Uuid],
    ) -> Result<(), CacheError> {
        let detail_keys: Vec<String> = item_ids
            .iter()
            .map(|item_id| keys::item(company_id, *item_id))
            .collect();
        self.cache.delete(&detail_keys).await?;
        apply_rules(&self.cache, Entity::Item, WriteEvent::Deleted, Some(company_id)).await?;
        Ok(())
    }
}
