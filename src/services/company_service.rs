//! Company service. Deleting a company deletes its items at the store and
//! drops both namespaces from the cache in one step.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Company, NewCompany, UpdateCompany};
use crate::repositories::CompanyStore;
use crate::services::Pagination;
use crate::services::access::{self, Caller};
use crate::services::cache::CompanyCacheService;

#[derive(Clone)]
pub struct CompanyService {
    repo: Arc<dyn CompanyStore>,
    cache: CompanyCacheService,
}

impl CompanyService {
    pub fn new(repo: Arc<dyn CompanyStore>, cache: CompanyCacheService) -> Self {
        Self { repo, cache }
    }

    /// Creates a company owned by the caller.
    pub async fn create_company(&self, name: &str, caller: &Caller) -> AppResult<Company> {
        access::ensure_active(caller)?;
        let new_company = NewCompany::new(name, caller.id);
        new_company.validate()?;

        let company = self.repo.create(new_company).await?;
        self.cache.invalidate_on_create().await.map_err(|e| {
            error!(company_id = %company.id, error = %e, "Failed to invalidate company cache after create");
            e
        })?;

        info!(company_id = %company.id, owner = %caller.id, "Company created");
        Ok(company)
    }

    pub async fn get_company(&self, id: Uuid, caller: &Caller) -> AppResult<Company> {
        let company = match self.cache.get(id).await? {
            Some(company) => company,
            None => {
                let company = self
                    .repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("company", "id", id))?;
                self.cache.store(&company).await?;
                company
            }
        };

        access::ensure_active(caller)?;
        Ok(company)
    }

    pub async fn list_companies(
        &self,
        page: Pagination,
        caller: &Caller,
    ) -> AppResult<Vec<Company>> {
        let companies = match self.cache.get_page(page.offset, page.limit).await? {
            Some(companies) => companies,
            None => {
                let companies = self.repo.list(page.offset, page.limit).await?;
                self.cache
                    .set_page(page.offset, page.limit, &companies)
                    .await?;
                companies
            }
        };

        access::ensure_active(caller)?;
        Ok(companies)
    }

    /// Renames a company. Owner or admin only.
    pub async fn update_company(
        &self,
        id: Uuid,
        changes: UpdateCompany,
        caller: &Caller,
    ) -> AppResult<Company> {
        if changes.is_empty() {
            return Err(AppError::validation("company", "No fields to update"));
        }
        changes.validate()?;

        let existing = self.find_for_write(id).await?;
        access::ensure_company_owner(caller, &existing)?;

        let company = self
            .repo
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("company", "id", id))?;
        self.cache.invalidate_on_update(&company).await.map_err(|e| {
            error!(company_id = %id, error = %e, "Failed to invalidate company cache after update");
            e
        })?;

        info!(company_id = %id, "Company updated");
        Ok(company)
    }

    /// Deletes a company and all of its items. Owner or admin only.
    pub async fn delete_company(&self, id: Uuid, caller: &Caller) -> AppResult<()> {
        let existing = self.find_for_write(id).await?;
        access::ensure_company_owner(caller, &existing)?;

        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("company", "id", id));
        }
        self.cache.invalidate_on_delete(id).await.map_err(|e| {
            error!(company_id = %id, error = %e, "Failed to invalidate cache after company delete");
            e
        })?;

        info!(company_id = %id, "Company deleted");
        Ok(())
    }

    /// Writes check ownership against the store, not a cached copy.
    async fn find_for_write(&self, id: Uuid) -> AppResult<Company> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("company", "id", id))
    }
}
