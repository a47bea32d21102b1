//! User service for business logic operations.
//!
//! Reads go through [`UserCacheService`]; writes commit through the
//! [`UserStore`] first and invalidate afterwards.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::{CompanyStore, UserStore};
use crate::services::Pagination;
use crate::services::access::{self, Caller};
use crate::services::cache::{MultipleUsers, UserCacheService};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserStore>,
    companies: Arc<dyn CompanyStore>,
    cache: UserCacheService,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserStore>,
        companies: Arc<dyn CompanyStore>,
        cache: UserCacheService,
    ) -> Self {
        Self {
            repo,
            companies,
            cache,
        }
    }

    /// Registers a user. Username and email must both be unused.
    pub async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        new_user.validate()?;
        self.ensure_username_free(&new_user.username).await?;
        self.ensure_email_free(&new_user.email).await?;

        let user = self.repo.create(new_user).await?;
        self.cache.invalidate_on_create().await.map_err(|e| {
            error!(user_id = %user.id, error = %e, "Failed to invalidate user cache after create");
            e
        })?;

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Gets a user by id. Only the user themselves or an admin may read it.
    pub async fn get_user_by_id(&self, id: Uuid, caller: &Caller) -> AppResult<User> {
        access::ensure_active(caller)?;

        let user = match self.cache.get_by_id(id).await? {
            Some(user) => user,
            None => {
                let user = self
                    .repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("user", "id", id))?;
                self.cache.store(&user).await?;
                user
            }
        };

        access::ensure_self_or_admin(caller, user.id)?;
        Ok(user)
    }

    /// Lookup for the authentication layer, which has no caller yet.
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        if let Some(user) = self.cache.get_by_username(username).await? {
            return Ok(Some(user));
        }

        let user = self.repo.find_by_username(username).await?;
        if let Some(user) = &user {
            self.cache.store(user).await?;
        }
        Ok(user)
    }

    /// Admin-only batch lookup. Unknown ids are reported, not treated as errors.
    pub async fn get_users_by_ids(&self, ids: &[Uuid], caller: &Caller) -> AppResult<MultipleUsers> {
        access::ensure_admin(caller)?;

        let repo = self.repo.clone();
        self.cache
            .get_many(ids, |missing| async move { repo.find_by_ids(&missing).await })
            .await
    }

    /// Admin-only page of users.
    pub async fn list_users(&self, page: Pagination, caller: &Caller) -> AppResult<Vec<User>> {
        access::ensure_admin(caller)?;

        if let Some(users) = self.cache.get_page(page.offset, page.limit).await? {
            return Ok(users);
        }

        let users = self.repo.list(page.offset, page.limit).await?;
        self.cache
            .set_page(page.offset, page.limit, &users)
            .await?;
        Ok(users)
    }

    /// Updates a user. Changing `is_active` is reserved to admins.
    pub async fn update_user(
        &self,
        id: Uuid,
        changes: UpdateUser,
        caller: &Caller,
    ) -> AppResult<User> {
        access::ensure_self_or_admin(caller, id)?;
        if changes.is_active.is_some() && !caller.is_admin() {
            return Err(AppError::forbidden("Only admins can change account status"));
        }
        if changes.is_empty() {
            return Err(AppError::validation("user", "No fields to update"));
        }
        changes.validate()?;

        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", id))?;

        if let Some(username) = changes
            .username
            .as_deref()
            .filter(|username| *username != existing.username)
        {
            self.ensure_username_free(username).await?;
        }
        if let Some(email) = changes
            .email
            .as_deref()
            .filter(|email| *email != existing.email)
        {
            self.ensure_email_free(email).await?;
        }

        let user = self
            .repo
            .update(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", id))?;
        self.cache
            .invalidate_on_update(&user, &existing.username)
            .await
            .map_err(|e| {
                error!(user_id = %id, error = %e, "Failed to invalidate user cache after update");
                e
            })?;

        info!(user_id = %id, "User updated");
        Ok(user)
    }

    /// Deletes a user who no longer owns any company.
    pub async fn delete_user(&self, id: Uuid, caller: &Caller) -> AppResult<()> {
        access::ensure_self_or_admin(caller, id)?;

        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("user", "id", id))?;

        let owned = self.companies.count_by_owner(id).await?;
        if owned > 0 {
            return Err(AppError::conflict(format!(
                "User {id} still owns {owned} companies"
            )));
        }

        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("user", "id", id));
        }
        self.cache.invalidate_on_delete(&existing).await.map_err(|e| {
            error!(user_id = %id, error = %e, "Failed to invalidate user cache after delete");
            e
        })?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str) -> AppResult<()> {
        match self.repo.find_by_username(username).await? {
            Some(_) => Err(AppError::duplicate("user", "username", username)),
            None => Ok(()),
        }
    }

    async fn ensure_email_free(&self, email: &str) -> AppResult<()> {
        match self.repo.find_by_email(email).await? {
            Some(_) => Err(AppError::duplicate("user", "email", email)),
            None => Ok(()),
        }
    }
}
