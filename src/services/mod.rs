//! Service layer for business logic operations.
//!
//! Services coordinate the repositories with the entity cache services:
//! reads are cache-aside, writes commit first and invalidate after.

pub mod access;
pub mod cache;
mod company_service;
mod item_service;
mod pagination;
#[cfg(test)]
pub(crate) mod testing;
mod user_service;

pub use access::Caller;
pub use company_service::CompanyService;
pub use item_service::ItemService;
pub use pagination::{MAX_PAGE_SIZE, Pagination};
pub use user_service::UserService;

use crate::cache::CacheManager;
use crate::repositories::Repositories;
use crate::services::cache::{CompanyCacheService, ItemCacheService, UserCacheService};

/// Aggregates all services. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub companies: CompanyService,
    pub items: ItemService,
}

impl Services {
    pub fn new(repos: Repositories, cache: CacheManager) -> Self {
        Self {
            users: UserService::new(
                repos.users,
                repos.companies.clone(),
                UserCacheService::new(cache.clone()),
            ),
            companies: CompanyService::new(
                repos.companies.clone(),
                CompanyCacheService::new(cache.clone()),
            ),
            items: ItemService::new(
                repos.items,
                repos.companies,
                ItemCacheService::new(cache),
            ),
        }
    }
}
