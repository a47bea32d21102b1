//! Typed JSON encoding for cache values.
//!
//! Non-primitive values are written as tagged objects, `{"__type__": <tag>, ...}`.
//! Decoding resolves tags through a fixed registry; a tag that is not in the
//! registry is kept as a plain map so that entries written by a newer build
//! still load.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::cache::CacheError;
use crate::cache::value::{CacheRecord, CacheValue, Fields};
use crate::models::{Company, Item, User};

/// Object key carrying the type tag.
pub const TYPE_KEY: &str = "__type__";

const UUID_TAG: &str = "UUID";
const DECIMAL_TAG: &str = "Decimal";
const TIMESTAMP_TAG: &str = "Timestamp";
/// Wraps a map whose own keys include [`TYPE_KEY`].
const MAP_TAG: &str = "Map";

/// Encode/decode between [`CacheValue`] and the store's string form.
pub trait CacheSerializer: Send + Sync {
    fn encode(&self, value: &CacheValue) -> Result<String, CacheError>;

    fn decode(&self, raw: &str) -> Result<CacheValue, CacheError>;
}

type Decoder = fn(Map<String, Value>) -> Result<CacheValue, CacheError>;

/// Tag name to constructor. Resolved at decode time only.
static REGISTRY: &[(&str, Decoder)] = &[
    (UUID_TAG, decode_uuid),
    (DECIMAL_TAG, decode_decimal),
    (TIMESTAMP_TAG, decode_timestamp),
    (MAP_TAG, decode_wrapped_map),
    (User::TYPE_TAG, decode_record::<User>),
    (Company::TYPE_TAG, decode_record::<Company>),
    (Item::TYPE_TAG, decode_record::<Item>),
];

fn lookup(tag: &str) -> Option<Decoder> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, decoder)| *decoder)
}

/// Every tag the decoder can reconstruct.
#[cfg(test)]
fn registered_tags() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// JSON serializer with the built-in tag registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl CacheSerializer for JsonSerializer {
    fn encode(&self, value: &CacheValue) -> Result<String, CacheError> {
        Ok(serde_json::to_string(&to_json(value)?)?)
    }

    fn decode(&self, raw: &str) -> Result<CacheValue, CacheError> {
        from_json(serde_json::from_str(raw)?)
    }
}

fn tagged(tag: &str, body: Map<String, Value>) -> Value {
    let mut object = body;
    object.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
    Value::Object(object)
}

fn tagged_scalar(tag: &str, value: String) -> Value {
    let mut body = Map::new();
    body.insert("value".to_string(), Value::String(value));
    tagged(tag, body)
}

fn encode_entries<'a>(
    entries: impl Iterator<Item = (&'a String, &'a CacheValue)>,
) -> Result<Map<String, Value>, CacheError> {
    entries
        .map(|(key, value)| Ok((key.clone(), to_json(value)?)))
        .collect()
}

fn to_json(value: &CacheValue) -> Result<Value, CacheError> {
    Ok(match value {
        CacheValue::Null => Value::Null,
        CacheValue::Bool(flag) => Value::Bool(*flag),
        CacheValue::Int(n) => Value::Number((*n).into()),
        CacheValue::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
            CacheError::Serialization(format!("cannot encode non-finite float {f}"))
        })?,
        CacheValue::Text(text) => Value::String(text.clone()),
        CacheValue::Uuid(id) => tagged_scalar(UUID_TAG, id.to_string()),
        CacheValue::Decimal(decimal) => tagged_scalar(DECIMAL_TAG, decimal.to_string()),
        CacheValue::Timestamp(ts) => tagged_scalar(TIMESTAMP_TAG, ts.to_string()),
        CacheValue::List(values) => {
            Value::Array(values.iter().map(to_json).collect::<Result<_, _>>()?)
        }
        CacheValue::Map(entries) => {
            let object = encode_entries(entries.iter())?;
            if entries.contains_key(TYPE_KEY) {
                let mut body = Map::new();
                body.insert("entries".to_string(), Value::Object(object));
                tagged(MAP_TAG, body)
            } else {
                Value::Object(object)
            }
        }
        CacheValue::Record(record) => {
            let fields = record.to_fields();
            debug_assert!(
                fields.values().all(CacheValue::is_scalar),
                "{} record emitted a non-scalar field",
                record.type_tag()
            );
            tagged(record.type_tag(), encode_entries(fields.iter())?)
        }
    })
}

fn from_json(value: Value) -> Result<CacheValue, CacheError> {
    Ok(match value {
        Value::Null => CacheValue::Null,
        Value::Bool(flag) => CacheValue::Bool(flag),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CacheValue::Int(i),
            None => CacheValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => CacheValue::Text(text),
        Value::Array(values) => {
            CacheValue::List(values.into_iter().map(from_json).collect::<Result<_, _>>()?)
        }
        Value::Object(mut object) => {
            let decoder = match object.get(TYPE_KEY) {
                Some(Value::String(tag)) => lookup(tag),
                _ => None,
            };
            match decoder {
                Some(decoder) => {
                    object.remove(TYPE_KEY);
                    decoder(object)?
                }
                None => CacheValue::Map(decode_entries(object)?),
            }
        }
    })
}

fn decode_entries(object: Map<String, Value>) -> Result<Fields, CacheError> {
    object
        .into_iter()
        .map(|(key, value)| Ok((key, from_json(value)?)))
        .collect()
}

fn scalar_body(tag: &str, mut object: Map<String, Value>) -> Result<String, CacheError> {
    match object.remove("value") {
        Some(Value::String(value)) => Ok(value),
        _ => Err(CacheError::Serialization(format!(
            "{tag} entry has no string 'value'"
        ))),
    }
}

fn decode_uuid(object: Map<String, Value>) -> Result<CacheValue, CacheError> {
    let raw = scalar_body(UUID_TAG, object)?;
    Uuid::parse_str(&raw)
        .map(CacheValue::Uuid)
        .map_err(|e| CacheError::Serialization(format!("invalid UUID '{raw}': {e}")))
}

fn decode_decimal(object: Map<String, Value>) -> Result<CacheValue, CacheError> {
    let raw = scalar_body(DECIMAL_TAG, object)?;
    BigDecimal::from_str(&raw)
        .map(CacheValue::Decimal)
        .map_err(|e| CacheError::Serialization(format!("invalid decimal '{raw}': {e}")))
}

fn decode_timestamp(object: Map<String, Value>) -> Result<CacheValue, CacheError> {
    let raw = scalar_body(TIMESTAMP_TAG, object)?;
    raw.parse::<jiff::Timestamp>()
        .map(CacheValue::Timestamp)
        .map_err(|e| CacheError::Serialization(format!("invalid timestamp '{raw}': {e}")))
}

fn decode_wrapped_map(mut object: Map<String, Value>) -> Result<CacheValue, CacheError> {
    match object.remove("entries") {
        Some(Value::Object(entries)) => Ok(CacheValue::Map(decode_entries(entries)?)),
        _ => Err(CacheError::Serialization(
            "Map entry has no object 'entries'".to_string(),
        )),
    }
}

fn decode_record<T: CacheRecord>(object: Map<String, Value>) -> Result<CacheValue, CacheError> {
    let record = T::from_fields(decode_entries(object)?)?;
    Ok(CacheValue::record(record))
}
