use bigdecimal::{BigDecimal, Zero};
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::Company;

/// `items.price` is `numeric(10, 2)`.
const MAX_PRICE_DIGITS: u64 = 10;
const PRICE_SCALE: i64 = 2;

#[derive(Debug, Queryable, Selectable, Identifiable, Associations, Clone, PartialEq)]
#[diesel(table_name = crate::schema::items)]
#[diesel(belongs_to(Company))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub company_id: Uuid,
}

fn validate_price(price: &BigDecimal) -> Result<(), ValidationError> {
    if *price < BigDecimal::zero() {
        return Err(ValidationError::new("price_negative"));
    }
    let (_, scale) = price.normalized().as_bigint_and_exponent();
    if scale > PRICE_SCALE {
        return Err(ValidationError::new("price_scale"));
    }
    let integer_digits = price.with_scale(0).digits();
    if integer_digits > MAX_PRICE_DIGITS - PRICE_SCALE as u64 {
        return Err(ValidationError::new("price_too_large"));
    }
    Ok(())
}

#[derive(Debug, Insertable, Validate, Clone)]
#[diesel(table_name = crate::schema::items)]
pub struct NewItem {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Item title must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(custom(function = "validate_price"))]
    pub price: BigDecimal,
    pub company_id: Uuid,
}

impl NewItem {
    pub fn new(title: impl Into<String>, price: BigDecimal, company_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            price,
            company_id,
        }
    }
}

#[derive(Debug, AsChangeset, Validate, Deserialize, Clone, Default)]
#[diesel(table_name = crate::schema::items)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 100, message = "Item title must be between 1 and 100 characters"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<BigDecimal>,
}

impl UpdateItem {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none()
    }
}
