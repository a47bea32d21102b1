//! Item service.
//!
//! Every item operation is scoped to a company. Writes require the caller to
//! own that company (or be an admin); reads check that the item really
//! belongs to the requested company.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Company, Item, NewItem, UpdateItem};
use crate::repositories::{CompanyStore, ItemStore};
use crate::services::Pagination;
use crate::services::access::{self, Caller};
use crate::services::cache::ItemCacheService;

#[derive(Clone)]
pub struct ItemService {
    repo: Arc<dyn ItemStore>,
    companies: Arc<dyn CompanyStore>,
    cache: ItemCacheService,
}

fn unique(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn missing_items(missing: &[Uuid]) -> AppError {
    let ids = missing
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    AppError::not_found("item", "id", ids)
}

impl ItemService {
    pub fn new(
        repo: Arc<dyn ItemStore>,
        companies: Arc<dyn CompanyStore>,
        cache: ItemCacheService,
    ) -> Self {
        Self {
            repo,
            companies,
            cache,
        }
    }

    pub async fn create_item(&self, new_item: NewItem, caller: &Caller) -> AppResult<Item> {
        new_item.validate()?;
        self.owned_company(new_item.company_id, caller).await?;

        let item = self.repo.create(new_item).await?;
        self.cache
            .invalidate_on_create(item.company_id)
            .await
            .map_err(|e| {
                error!(item_id = %item.id, error = %e, "Failed to invalidate item cache after create");
                e
            })?;

        info!(item_id = %item.id, company_id = %item.company_id, "Item created");
        Ok(item)
    }

    pub async fn get_item(&self, company_id: Uuid, item_id: Uuid, caller: &Caller) -> AppResult<Item> {
        let item = match self.cache.get(company_id, item_id).await? {
            Some(item) => item,
            None => {
                let item = self
                    .repo
                    .find_by_id(item_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("item", "id", item_id))?;
                // Only cache under the key matching the item's real company.
                if item.company_id == company_id {
                    self.cache.store(&item).await?;
                }
                item
            }
        };

        access::ensure_active(caller)?;
        access::ensure_item_in_company(&item, company_id)?;
        Ok(item)
    }

    /// All of `ids` from one company. Any id that cannot be resolved makes
    /// the whole call fail with `NotFound` listing those ids.
    pub async fn get_items(
        &self,
        company_id: Uuid,
        ids: &[Uuid],
        caller: &Caller,
    ) -> AppResult<Vec<Item>> {
        let ids = unique(ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = match self.cache.get_batch(company_id, &ids).await? {
            Some(items) => items,
            None => {
                let items = self.repo.find_by_ids(company_id, &ids).await?;
                self.cache.set_batch(company_id, &ids, &items).await?;
                items
            }
        };

        access::ensure_active(caller)?;
        for item in &items {
            access::ensure_item_in_company(item, company_id)?;
        }

        let found: HashSet<Uuid> = items.iter().map(|item| item.id).collect();
        let missing: Vec<Uuid> = ids.into_iter().filter(|id| !found.contains(id)).collect();
        if !missing.is_empty() {
            warn!(company_id = %company_id, missing = missing.len(), "Batch item lookup incomplete");
            return Err(missing_items(&missing));
        }
        Ok(items)
    }

    pub async fn list_company_items(&self, company_id: Uuid, caller: &Caller) -> AppResult<Vec<Item>> {
        let items = match self.cache.get_company_listing(company_id).await? {
            Some(items) => items,
            None => {
                self.companies
                    .find_by_id(company_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("company", "id", company_id))?;
                let items = self.repo.list_by_company(company_id).await?;
                self.cache.set_company_listing(company_id, &items).await?;
                items
            }
        };

        access::ensure_active(caller)?;
        Ok(items)
    }

    pub async fn list_items(&self, page: Pagination, caller: &Caller) -> AppResult<Vec<Item>> {
        let items = match self.cache.get_page(page.offset, page.limit).await? {
            Some(items) => items,
            None => {
                let items = self.repo.list(page.offset, page.limit).await?;
                self.cache
                    .set_page(page.offset, page.limit, &items)
                    .await?;
                items
            }
        };

        access::ensure_active(caller)?;
        Ok(items)
    }

    pub async fn update_item(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        changes: UpdateItem,
        caller: &Caller,
    ) -> AppResult<Item> {
        if changes.is_empty() {
            return Err(AppError::validation("item", "No fields to update"));
        }
        changes.validate()?;
        self.owned_company(company_id, caller).await?;

        let existing = self
            .repo
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::not_found("item", "id", item_id))?;
        access::ensure_item_in_company(&existing, company_id)?;

        let item = self
            .repo
            .update(item_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("item", "id", item_id))?;
        self.cache.invalidate_on_update(&item).await.map_err(|e| {
            error!(item_id = %item_id, error = %e, "Failed to invalidate item cache after update");
            e
        })?;

        info!(item_id = %item_id, company_id = %company_id, "Item updated");
        Ok(item)
    }

    pub async fn delete_item(&self, company_id: Uuid, item_id: Uuid, caller: &Caller) -> AppResult<()> {
        self.delete_items(company_id, &[item_id], caller).await
    }

    /// Deletes every item in `ids`, or none if any of them is not an item of
    /// `company_id`.
    pub async fn delete_items(&self, company_id: Uuid, ids: &[Uuid], caller: &Caller) -> AppResult<()> {
        let ids = unique(ids);
        if ids.is_empty() {
            return Err(AppError::validation("ids", "At least one item id is required"));
        }
        self.owned_company(company_id, caller).await?;

        let existing = self.repo.find_by_ids(company_id, &ids).await?;
        let found: HashSet<Uuid> = existing.iter().map(|item| item.id).collect();
        let missing: Vec<Uuid> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
        if !missing.is_empty() {
            return Err(missing_items(&missing));
        }

        let deleted = self.repo.delete_many(company_id, &ids).await?;
        self.cache
            .invalidate_on_delete(company_id, &ids)
            .await
            .map_err(|e| {
                error!(company_id = %company_id, error = %e, "Failed to invalidate item cache after delete");
                e
            })?;

        info!(company_id = %company_id, deleted, "Items deleted");
        Ok(())
    }

    async fn owned_company(&self, company_id: Uuid, caller: &Caller) -> AppResult<Company> {
        let company = self
            .companies
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::not_found("company", "id", company_id))?;
        access::ensure_company_owner(caller, &company)?;
        Ok(company)
    }
}
