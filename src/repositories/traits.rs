//! Store traits the application services depend on.
//!
//! Every write returns only after its transaction has committed, so callers
//! can invalidate the cache as soon as the future resolves.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Company, Item, NewCompany, NewItem, NewUser, UpdateCompany, UpdateItem, UpdateUser, User,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Users among `ids`, in no particular order. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// One page ordered by username.
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<User>>;

    /// `None` when no row has `id`.
    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<Option<User>>;

    /// `false` when no row has `id`.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create(&self, new_company: NewCompany) -> AppResult<Company>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Company>>;

    /// One page ordered by name.
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Company>>;

    /// Number of companies owned by `user_id`.
    async fn count_by_owner(&self, user_id: Uuid) -> AppResult<i64>;

    async fn update(&self, id: Uuid, changes: UpdateCompany) -> AppResult<Option<Company>>;

    /// Delete the company together with all of its items.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, new_item: NewItem) -> AppResult<Item>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>>;

    /// Items of `company_id` among `ids`. Ids of other companies are skipped.
    async fn find_by_ids(&self, company_id: Uuid, ids: &[Uuid]) -> AppResult<Vec<Item>>;

    async fn list_by_company(&self, company_id: Uuid) -> AppResult<Vec<Item>>;

    /// One page across all companies, ordered by title.
    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Item>>;

    async fn update(&self, id: Uuid, changes: UpdateItem) -> AppResult<Option<Item>>;

    /// Delete the items of `company_id` among `ids`, returning how many were removed.
    async fn delete_many(&self, company_id: Uuid, ids: &[Uuid]) -> AppResult<u64>;
}
