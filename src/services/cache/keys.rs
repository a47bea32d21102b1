//! Key schema shared by the entity cache services.
//!
//! ```text
//! user:<id>                                  user:<username>
//! users:<offset>:<limit>
//! companies:company_id=<id>                  companies:all:offset=<n>:limit=<n>
//! items:company_id=<c>:item_id=<i>           items:company_id=<c>:items_ids=<sorted ids>
//! items:company_id=<c>:all                   items:all:offset=<n>:limit=<n>
//! ```

use std::fmt::Display;

use uuid::Uuid;

use crate::cache::CacheKey;

pub const USER: &str = "user";
pub const USER_PAGES: &str = "users";
pub const COMPANIES: &str = "companies";
pub const ITEMS: &str = "items";

pub fn user_by_id(id: Uuid) -> String {
    CacheKey::new(USER).part(id).into_string()
}

pub fn user_by_username(username: &str) -> String {
    CacheKey::new(USER).part(username).into_string()
}

pub fn user_page(offset: i64, limit: i64) -> String {
    CacheKey::new(USER_PAGES)
        .part(offset)
        .part(limit)
        .into_string()
}

pub fn company(id: Uuid) -> String {
    CacheKey::new(COMPANIES)
        .field("company_id", id)
        .into_string()
}

pub fn company_page(offset: i64, limit: i64) -> String {
    listing_page(COMPANIES, offset, limit)
}

/// `items:company_id=<c>`, the prefix of every company-scoped item entry.
pub fn company_items(company_id: Uuid) -> CacheKey {
    CacheKey::new(ITEMS).field("company_id", company_id)
}

pub fn item(company_id: Uuid, item_id: Uuid) -> String {
    company_items(company_id)
        .field("item_id", item_id)
        .into_string()
}

pub fn item_batch<I, T>(company_id: Uuid, ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    company_items(company_id)
        .id_set("items_ids", ids)
        .into_string()
}

pub fn company_item_listing(company_id: Uuid) -> CacheKey {
    company_items(company_id).part("all")
}

pub fn item_page(offset: i64, limit: i64) -> String {
    listing_page(ITEMS, offset, limit)
}

fn listing_page(namespace: &str, offset: i64, limit: i64) -> String {
    CacheKey::new(namespace)
        .part("all")
        .field("offset", offset)
        .field("limit", limit)
        .into_string()
}
