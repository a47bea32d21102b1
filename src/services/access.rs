//! Authorization checks applied to every read and write.
//!
//! Cache entries are shared by all callers, so these run on the value after
//! it has been obtained, whether it came from the cache or the store.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Company, Item, Role, User};

/// The authenticated user making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role(),
            is_active: user.is_active,
        }
    }
}

pub fn ensure_active(caller: &Caller) -> AppResult<()> {
    if caller.is_active {
        Ok(())
    } else {
        Err(AppError::forbidden("Inactive user"))
    }
}

pub fn ensure_admin(caller: &Caller) -> AppResult<()> {
    ensure_active(caller)?;
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin role required"))
    }
}

pub fn ensure_self_or_admin(caller: &Caller, user_id: Uuid) -> AppResult<()> {
    ensure_active(caller)?;
    if caller.id == user_id || caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Not enough permissions"))
    }
}

/// The caller owns `company` or is an admin.
pub fn ensure_company_owner(caller: &Caller, company: &Company) -> AppResult<()> {
    ensure_self_or_admin(caller, company.user_id)
}

pub fn ensure_item_in_company(item: &Item, company_id: Uuid) -> AppResult<()> {
    if item.company_id == company_id {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Item {} does not belong to company {}",
            item.id, company_id
        )))
    }
}
