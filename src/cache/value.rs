//! Values that can live in the cache.
//!
//! `CacheValue` is the closed set of shapes the serializer knows how to
//! round-trip. Domain records are reached through [`Record`], a tagged union
//! over the aggregates the services cache; each one converts to and from a
//! flat field map via [`CacheRecord`].

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::cache::CacheError;
use crate::models::{Company, Item, User};

/// Flat field set of a record.
pub type Fields = BTreeMap<String, CacheValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Decimal(BigDecimal),
    Timestamp(jiff::Timestamp),
    List(Vec<CacheValue>),
    Map(BTreeMap<String, CacheValue>),
    Record(Record),
}

impl CacheValue {
    /// Whether this value is a leaf that a record field may hold.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            CacheValue::List(_) | CacheValue::Map(_) | CacheValue::Record(_)
        )
    }

    /// Human-readable name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Null => "null",
            CacheValue::Bool(_) => "bool",
            CacheValue::Int(_) => "int",
            CacheValue::Float(_) => "float",
            CacheValue::Text(_) => "text",
            CacheValue::Uuid(_) => "uuid",
            CacheValue::Decimal(_) => "decimal",
            CacheValue::Timestamp(_) => "timestamp",
            CacheValue::List(_) => "list",
            CacheValue::Map(_) => "map",
            CacheValue::Record(_) => "record",
        }
    }

    pub fn record<T: CacheRecord>(record: T) -> Self {
        CacheValue::Record(record.into_record())
    }

    pub fn records<T: CacheRecord>(records: impl IntoIterator<Item = T>) -> Self {
        CacheValue::List(records.into_iter().map(CacheValue::record).collect())
    }

    /// Unwrap a single record of type `T`.
    pub fn into_record<T: CacheRecord>(self) -> Option<T> {
        match self {
            CacheValue::Record(record) => T::from_record(record),
            _ => None,
        }
    }

    /// Unwrap a list where every element is a record of type `T`.
    pub fn into_records<T: CacheRecord>(self) -> Option<Vec<T>> {
        match self {
            CacheValue::List(values) => values.into_iter().map(CacheValue::into_record).collect(),
            _ => None,
        }
    }
}

/// The registered domain record kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    User(User),
    Company(Company),
    Item(Item),
}

impl Record {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Record::User(_) => User::TYPE_TAG,
            Record::Company(_) => Company::TYPE_TAG,
            Record::Item(_) => Item::TYPE_TAG,
        }
    }

    /// Column-level fields only. Relationships are never part of a record.
    pub fn to_fields(&self) -> Fields {
        match self {
            Record::User(user) => user.to_fields(),
            Record::Company(company) => company.to_fields(),
            Record::Item(item) => item.to_fields(),
        }
    }
}

/// A domain type that can be stored as a tagged record.
pub trait CacheRecord: Sized {
    /// Tag written into the serialized form.
    const TYPE_TAG: &'static str;

    /// Flat column values. Implementations must only emit scalars.
    fn to_fields(&self) -> Fields;

    /// Rebuild from decoded fields.
    fn from_fields(fields: Fields) -> Result<Self, CacheError>;

    fn into_record(self) -> Record;

    fn from_record(record: Record) -> Option<Self>;
}

/// Typed field extraction for `from_fields` implementations.
pub(crate) struct FieldReader {
    tag: &'static str,
    fields: Fields,
}

impl FieldReader {
    pub(crate) fn new(tag: &'static str, fields: Fields) -> Self {
        Self { tag, fields }
    }

    fn take(&mut self, name: &str) -> Result<CacheValue, CacheError> {
        self.fields.remove(name).ok_or_else(|| {
            CacheError::Serialization(format!("{} record is missing field '{}'", self.tag, name))
        })
    }

    fn mismatch(&self, name: &str, expected: &str, found: &CacheValue) -> CacheError {
        CacheError::Serialization(format!(
            "{} field '{}' should be {}, found {}",
            self.tag,
            name,
            expected,
            found.kind()
        ))
    }

    pub(crate) fn uuid(&mut self, name: &str) -> Result<Uuid, CacheError> {
        match self.take(name)? {
            CacheValue::Uuid(id) => Ok(id),
            other => Err(self.mismatch(name, "uuid", &other)),
        }
    }

    pub(crate) fn text(&mut self, name: &str) -> Result<String, CacheError> {
        match self.take(name)? {
            CacheValue::Text(text) => Ok(text),
            other => Err(self.mismatch(name, "text", &other)),
        }
    }

    pub(crate) fn bool(&mut self, name: &str) -> Result<bool, CacheError> {
        match self.take(name)? {
            CacheValue::Bool(flag) => Ok(flag),
            other => Err(self.mismatch(name, "bool", &other)),
        }
    }

    pub(crate) fn decimal(&mut self, name: &str) -> Result<BigDecimal, CacheError> {
        match self.take(name)? {
            CacheValue::Decimal(value) => Ok(value),
            other => Err(self.mismatch(name, "decimal", &other)),
        }
    }

    pub(crate) fn timestamp(&mut self, name: &str) -> Result<jiff::Timestamp, CacheError> {
        match self.take(name)? {
            CacheValue::Timestamp(ts) => Ok(ts),
            other => Err(self.mismatch(name, "timestamp", &other)),
        }
    }
}
