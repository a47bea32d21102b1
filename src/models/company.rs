use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::User;

#[derive(Debug, Queryable, Selectable, Identifiable, Associations, Clone, PartialEq)]
#[diesel(table_name = crate::schema::companies)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
}

#[derive(Debug, Insertable, Validate, Clone)]
#[diesel(table_name = crate::schema::companies)]
pub struct NewCompany {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Company name must be between 1 and 100 characters"))]
    pub name: String,
    pub user_id: Uuid,
}

impl NewCompany {
    pub fn new(name: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            user_id,
        }
    }
}

#[derive(Debug, AsChangeset, Validate, Deserialize, Clone, Default)]
#[diesel(table_name = crate::schema::companies)]
pub struct UpdateCompany {
    #[validate(length(min = 1, max = 100, message = "Company name must be between 1 and 100 characters"))]
    pub name: Option<String>,
}

impl UpdateCompany {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}
