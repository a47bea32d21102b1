//! Company detail and listing entries.

use tracing::debug;
use uuid::Uuid;

use crate::cache::{CacheError, CacheManager, CacheValue};
use crate::models::Company;
use crate::services::cache::{Entity, WriteEvent, apply_rules, keys};

#[derive(Clone)]
pub struct CompanyCacheService {
    cache: CacheManager,
}

impl CompanyCacheService {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Company>, CacheError> {
        self.cache.get_record(&keys::company(id)).await
    }

    pub async fn store(&self, company: &Company) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::company(company.id),
                &CacheValue::record(company.clone()),
                None,
            )
            .await
    }

    pub async fn get_page(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Option<Vec<Company>>, CacheError> {
        self.cache
            .get_records(&keys::company_page(offset, limit))
            .await
    }

    pub async fn set_page(
        &self,
        offset: i64,
        limit: i64,
        companies: &[Company],
    ) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::company_page(offset, limit),
                &CacheValue::records(companies.iter().cloned()),
                None,
            )
            .await
    }

    pub async fn invalidate_on_create(&self) -> Result<(), CacheError> {
        apply_rules(&self.cache, Entity::Company, WriteEvent::Created, None).await?;
        Ok(())
    }

    /// Overwrite the detail entry in place and drop the listings.
    pub async fn invalidate_on_update(&self, company: &Company) -> Result<(), CacheError> {
        self.store(company).await?;
        apply_rules(&self.cache, Entity::Company, WriteEvent::Updated, None).await?;
        Ok(())
    }

    /// Drop the company and item namespaces together.
    pub async fn invalidate_on_delete(&self, id: Uuid) -> Result<(), CacheError> {
        let deleted = apply_rules(&self.cache, Entity::Company, WriteEvent::Deleted, None).await?;
        debug!(company_id = %id, deleted, "company cascade invalidated");
        Ok(())
    }
}
