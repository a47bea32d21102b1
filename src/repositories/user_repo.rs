//! User repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserStore;
use crate::schema::users;

/// `bb8::Pool` is reference counted, so cloning the repository is cheap.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: AsyncDbPool,
}

impl PgUserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let user = diesel::insert_into(users::table)
                    .values(&new_user)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(user)
            }
            .scope_boxed()
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::id.eq_any(ids))
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .order(users::username.asc())
            .offset(offset)
            .limit(limit)
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let now = jiff::Timestamp::now().to_diesel();
                let user = diesel::update(users::table.find(id))
                    .set((&changes, users::updated_at.eq(now)))
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                Ok(user)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let deleted = diesel::delete(users::table.find(id))
                    .execute(conn)
                    .await?;
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
    }
}
