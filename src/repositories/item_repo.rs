//! Item repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Item, NewItem, UpdateItem};
use crate::repositories::ItemStore;
use crate::schema::items;

#[derive(Clone)]
pub struct PgItemRepository {
    pool: AsyncDbPool,
}

impl PgItemRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemRepository {
    async fn create(&self, new_item: NewItem) -> AppResult<Item> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let item = diesel::insert_into(items::table)
                    .values(&new_item)
                    .returning(Item::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(item)
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        let mut conn = self.pool.get().await?;

        items::table
            .find(id)
            .select(Item::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn find_by_ids(&self, company_id: Uuid, ids: &[Uuid]) -> AppResult<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        items::table
            .filter(items::company_id.eq(company_id))
            .filter(items::id.eq_any(ids))
            .select(Item::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn list_by_company(&self, company_id: Uuid) -> AppResult<Vec<Item>> {
        let mut conn = self.pool.get().await?;

        items::table
            .filter(items::company_id.eq(company_id))
            .order(items::title.asc())
            .select(Item::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<Item>> {
        let mut conn = self.pool.get().await?;

        items::table
            .order(items::title.asc())
            .offset(offset)
            .limit(limit)
            .select(Item::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update(&self, id: Uuid, changes: UpdateItem) -> AppResult<Option<Item>> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let item = diesel::update(items::table.find(id))
                    .set(&changes)
                    .returning(Item::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                Ok(item)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete_many(&self, company_id: Uuid, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.to_vec();
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let deleted = diesel::delete(
                    items::table
                        .filter(items::company_id.eq(company_id))
                        .filter(items::id.eq_any(&ids)),
                )
                .execute(conn)
                .await?;
                Ok(deleted as u64)
            }
            .scope_boxed()
        })
        .await
    }
}
