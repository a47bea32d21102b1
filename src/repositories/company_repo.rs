//! Company repository. Deleting a company takes its items with it.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Company, NewCompany, UpdateCompany};
use crate::repositories::CompanyStore;
use crate::schema::{companies, items};

#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: AsyncDbPool,
}

impl PgCompanyRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyStore for PgCompanyRepository {
    async fn create(&self, new_company: NewCompany) -> AppResult<Company> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let company = diesel::insert_into(companies::table)
                    .values(&new_company)
                    .returning(Company::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(company)
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Company>> {
        let mut conn = self.pool.get().await?;

        companies::table
            .find(id)
            .select(Company::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Company>> {
        let mut conn = self.pool.get().await?;

        companies::table
            .order(companies::name.asc())
            .offset(offset)
            .limit(limit)
            .select(Company::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn count_by_owner(&self, user_id: Uuid) -> AppResult<i64> {
        let mut conn = self.pool.get().await?;

        companies::table
            .filter(companies::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update(&self, id: Uuid, changes: UpdateCompany) -> AppResult<Option<Company>> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let company = diesel::update(companies::table.find(id))
                    .set(&changes)
                    .returning(Company::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                Ok(company)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let removed_items = diesel::delete(items::table.filter(items::company_id.eq(id)))
                    .execute(conn)
                    .await?;
                let deleted = diesel::delete(companies::table.find(id))
                    .execute(conn)
                    .await?;
                debug!(company_id = %id, removed_items, "company delete cascaded to items");
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
    }
}
