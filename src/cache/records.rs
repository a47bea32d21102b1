//! `CacheRecord` implementations for the cached aggregates.
//!
//! Only columns are written. `Company` carries `user_id` but never its owner
//! or its items; `Item` carries `company_id` but never its company.

use jiff_diesel::ToDiesel;

use crate::cache::value::{CacheRecord, CacheValue, FieldReader, Fields, Record};
use crate::cache::CacheError;
use crate::models::{Company, Item, User};

fn fields<const N: usize>(pairs: [(&str, CacheValue); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

impl CacheRecord for User {
    const TYPE_TAG: &'static str = "User";

    fn to_fields(&self) -> Fields {
        fields([
            ("id", CacheValue::Uuid(self.id)),
            ("username", CacheValue::Text(self.username.clone())),
            ("email", CacheValue::Text(self.email.clone())),
            ("hashed_password", CacheValue::Text(self.hashed_password.clone())),
            ("role", CacheValue::Text(self.role.clone())),
            ("is_active", CacheValue::Bool(self.is_active)),
            ("created_at", CacheValue::Timestamp(self.created_at.to_jiff())),
            ("updated_at", CacheValue::Timestamp(self.updated_at.to_jiff())),
        ])
    }

    fn from_fields(fields: Fields) -> Result<Self, CacheError> {
        let mut reader = FieldReader::new(Self::TYPE_TAG, fields);
        Ok(Self {
            id: reader.uuid("id")?,
            username: reader.text("username")?,
            email: reader.text("email")?,
            hashed_password: reader.text("hashed_password")?,
            role: reader.text("role")?,
            is_active: reader.bool("is_active")?,
            created_at: reader.timestamp("created_at")?.to_diesel(),
            updated_at: reader.timestamp("updated_at")?.to_diesel(),
        })
    }

    fn into_record(self) -> Record {
        Record::User(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::User(user) => Some(user),
            _ => None,
        }
    }
}

impl CacheRecord for Company {
    const TYPE_TAG: &'static str = "Company";

    fn to_fields(&self) -> Fields {
        fields([
            ("id", CacheValue::Uuid(self.id)),
            ("name", CacheValue::Text(self.name.clone())),
            ("user_id", CacheValue::Uuid(self.user_id)),
        ])
    }

    fn from_fields(fields: Fields) -> Result<Self, CacheError> {
        let mut reader = FieldReader::new(Self::TYPE_TAG, fields);
        Ok(Self {
            id: reader.uuid("id")?,
            name: reader.text("name")?,
            user_id: reader.uuid("user_id")?,
        })
    }

    fn into_record(self) -> Record {
        Record::Company(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Company(company) => Some(company),
            _ => None,
        }
    }
}

impl CacheRecord for Item {
    const TYPE_TAG: &'static str = "Item";

    fn to_fields(&self) -> Fields {
        fields([
            ("id", CacheValue::Uuid(self.id)),
            ("title", CacheValue::Text(self.title.clone())),
            ("price", CacheValue::Decimal(self.price.clone())),
            ("company_id", CacheValue::Uuid(self.company_id)),
        ])
    }

    fn from_fields(fields: Fields) -> Result<Self, CacheError> {
        let mut reader = FieldReader::new(Self::TYPE_TAG, fields);
        Ok(Self {
            id: reader.uuid("id")?,
            title: reader.text("title")?,
            price: reader.decimal("price")?,
            company_id: reader.uuid("company_id")?,
        })
    }

    fn into_record(self) -> Record {
        Record::Item(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Item(item) => Some(item),
            _ => None,
        }
    }
}
