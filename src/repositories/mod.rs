//! Repository layer for data access operations.
//!
//! The application services only see the [`UserStore`], [`CompanyStore`] and
//! [`ItemStore`] traits; the `Pg*` types implement them on the async pool.

mod company_repo;
mod item_repo;
mod traits;
mod user_repo;

use std::sync::Arc;

pub use company_repo::PgCompanyRepository;
pub use item_repo::PgItemRepository;
pub use traits::{CompanyStore, ItemStore, UserStore};
pub use user_repo::PgUserRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories behind their store traits.
///
/// Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub companies: Arc<dyn CompanyStore>,
    pub items: Arc<dyn ItemStore>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            companies: Arc::new(PgCompanyRepository::new(pool.clone())),
            items: Arc::new(PgItemRepository::new(pool)),
        }
    }
}
