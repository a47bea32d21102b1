//! Which cache families a write makes stale.
//!
//! Every edge lives in [`RULES`]. The entity cache services look their
//! patterns up here and drop them with a single `delete_pattern` call, so a
//! cascade (company deletion taking its items along) is one atomic step.

use std::fmt;

use uuid::Uuid;

use crate::cache::{CacheKey, InvalidationPattern};
use crate::services::cache::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Company,
    Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for WriteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteEvent::Created => "created",
            WriteEvent::Updated => "updated",
            WriteEvent::Deleted => "deleted",
        })
    }
}

/// A family of cache entries, expanded into a pattern at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// `<namespace>:*`
    Namespace(&'static str),
    /// `<namespace>:all:*`
    Listing(&'static str),
    /// `items:company_id=<c>:items_ids=*`
    CompanyItemBatches,
    /// `items:company_id=<c>:all`
    CompanyItemListing,
}

impl Family {
    /// `None` when the family needs a company id and none was given.
    fn pattern(self, company_id: Option<Uuid>) -> Option<InvalidationPattern> {
        match self {
            Family::Namespace(namespace) => Some(InvalidationPattern::namespace(namespace)),
            Family::Listing(namespace) => {
                Some(InvalidationPattern::under(CacheKey::new(namespace).part("all")))
            }
            Family::CompanyItemBatches => company_id.map(|company_id| {
                InvalidationPattern::field_prefix(keys::company_items(company_id), "items_ids")
            }),
            Family::CompanyItemListing => company_id
                .map(|company_id| InvalidationPattern::exact(keys::company_item_listing(company_id))),
        }
    }
}

pub struct InvalidationRule {
    pub entity: Entity,
    pub event: WriteEvent,
    pub families: &'static [Family],
}

const ITEM_LISTINGS: &[Family] = &[
    Family::Listing(keys::ITEMS),
    Family::CompanyItemBatches,
    Family::CompanyItemListing,
];

pub static RULES: &[InvalidationRule] = &[
    InvalidationRule {
        entity: Entity::User,
        event: WriteEvent::Created,
        families: &[Family::Namespace(keys::USER_PAGES)],
    },
    InvalidationRule {
        entity: Entity::User,
        event: WriteEvent::Updated,
        families: &[Family::Namespace(keys::USER_PAGES)],
    },
    InvalidationRule {
        entity: Entity::User,
        event: WriteEvent::Deleted,
        families: &[Family::Namespace(keys::USER_PAGES)],
    },
    InvalidationRule {
        entity: Entity::Company,
        event: WriteEvent::Created,
        families: &[Family::Listing(keys::COMPANIES)],
    },
    InvalidationRule {
        entity: Entity::Company,
        event: WriteEvent::Updated,
        families: &[Family::Listing(keys::COMPANIES)],
    },
    // Items go with their company at the store, so they go in the cache too.
    InvalidationRule {
        entity: Entity::Company,
        event: WriteEvent::Deleted,
        families: &[
            Family::Namespace(keys::COMPANIES),
            Family::Namespace(keys::ITEMS),
        ],
    },
    InvalidationRule {
        entity: Entity::Item,
        event: WriteEvent::Created,
        families: ITEM_LISTINGS,
    },
    InvalidationRule {
        entity: Entity::Item,
        event: WriteEvent::Updated,
        families: ITEM_LISTINGS,
    },
    InvalidationRule {
        entity: Entity::Item,
        event: WriteEvent::Deleted,
        families: ITEM_LISTINGS,
    },
];

/// Patterns to drop after `event` on `entity` has committed.
///
/// `company_id` scopes the company-local item families.
pub fn patterns_for(
    entity: Entity,
    event: WriteEvent,
    company_id: Option<Uuid>,
) -> Vec<InvalidationPattern> {
    let mut patterns: Vec<InvalidationPattern> = RULES
        .iter()
        .filter(|rule| rule.entity == entity && rule.event == event)
        .flat_map(|rule| rule.families.iter())
        .filter_map(|family| family.pattern(company_id))
        .collect();
    patterns.sort();
    patterns.dedup();
    patterns
}
