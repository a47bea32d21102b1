//! Deterministic cache key construction.
//!
//! Keys are `:`-joined segments, `namespace:qualifier:qualifier...`. Free-form
//! parts are escaped so a value containing the delimiter cannot forge an
//! extra segment, and identifier sets are sorted so that the same set of ids
//! always lands on the same key regardless of request order.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

/// Segment delimiter.
pub const DELIMITER: char = ':';

/// Escape `%` and the delimiter. Delimiter-free input comes back unchanged.
pub fn escape_part(part: &str) -> String {
    if !part.contains(['%', DELIMITER]) {
        return part.to_string();
    }
    part.replace('%', "%25").replace(DELIMITER, "%3A")
}

/// Join a namespace and parts into one key string.
///
/// Parts are escaped and kept in caller order.
pub fn build_key<I, P>(namespace: &str, parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: Display,
{
    parts
        .into_iter()
        .fold(CacheKey::new(namespace), |key, part| key.part(part))
        .into_string()
}

/// Sort, deduplicate and comma-join a set of identifiers.
pub fn sorted_ids<I, T>(ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let unique: BTreeSet<String> = ids.into_iter().map(|id| id.to_string()).collect();
    unique.into_iter().collect::<Vec<_>>().join(",")
}

/// Builder for a single cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    segments: Vec<String>,
}

impl CacheKey {
    pub fn new(namespace: &str) -> Self {
        Self {
            segments: vec![escape_part(namespace)],
        }
    }

    /// Append a free-form part.
    pub fn part(mut self, part: impl Display) -> Self {
        self.segments.push(escape_part(&part.to_string()));
        self
    }

    /// Append a `name=value` part.
    pub fn field(mut self, name: &str, value: impl Display) -> Self {
        self.segments
            .push(format!("{}={}", name, escape_part(&value.to_string())));
        self
    }

    /// Append a `name=<sorted,ids>` part. Permutations of `ids` yield the same key.
    pub fn id_set<I, T>(mut self, name: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        self.segments
            .push(format!("{}={}", name, escape_part(&sorted_ids(ids))));
        self
    }

    pub fn into_string(self) -> String {
        self.segments.join(&DELIMITER.to_string())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(&DELIMITER.to_string()))
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.into_string()
    }
}

/// A glob over keys, naming a family of entries to drop together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvalidationPattern(String);

impl InvalidationPattern {
    /// Every entry in a namespace: `namespace:*`.
    pub fn namespace(namespace: &str) -> Self {
        Self(format!("{}{}*", escape_part(namespace), DELIMITER))
    }

    /// Every entry under a key prefix: `<prefix>:*`.
    pub fn under(prefix: CacheKey) -> Self {
        Self(format!("{}{}*", prefix.into_string(), DELIMITER))
    }

    /// Exactly `key`. The key must not contain glob metacharacters.
    pub fn exact(key: CacheKey) -> Self {
        Self(key.into_string())
    }

    /// Every entry whose last segment starts with `name=`: `<prefix>:name=*`.
    pub fn field_prefix(prefix: CacheKey, name: &str) -> Self {
        Self(format!("{}{}{}=*", prefix.into_string(), DELIMITER, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InvalidationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvalidationPattern {
    fn from(pattern: &str) -> Self {
        Self(pattern.to_string())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_build_key_joins_in_order() {
        assert_eq!(build_key("a", ["1", "b"]), "a:1:b");
        assert_eq!(build_key::<[&str; 0], &str>("users", []), "users");
        assert_eq!(build_key("users", [0, 10]), "users:0:10");
    }

    #[test]
    fn test_field_parts() {
        let key = CacheKey::new("companies")
            .part("all")
            .field("offset", 0)
            .field("limit", 10)
            .into_string();
        assert_eq!(key, "companies:all:offset=0:limit=10");
    }

    #[test]
    fn test_id_set_is_order_independent() {
        let ab = CacheKey::new("items").id_set("items_ids", ["b", "a"]).into_string();
        let ba = CacheKey::new("items").id_set("items_ids", ["a", "b"]).into_string();
        assert_eq!(ab, ba);
        assert_eq!(ab, "items:items_ids=a,b");
    }

    #[test]
    fn test_id_set_deduplicates() {
        let key = CacheKey::new("items").id_set("items_ids", ["a", "b", "a"]);
        assert_eq!(key.into_string(), "items:items_ids=a,b");
    }

    #[test]
    fn test_delimiter_in_part_cannot_forge_segment() {
        // Without escaping both would be "user:a:b".
        let forged = build_key("user", ["a:b"]);
        let genuine = build_key("user", ["a", "b"]);
        assert_ne!(forged, genuine);
        assert_eq!(forged, "user:a%3Ab");
    }

    #[test]
    fn test_escape_is_injective_on_percent() {
        assert_ne!(escape_part("a%3Ab"), escape_part("a:b"));
        assert_eq!(escape_part("plain"), "plain");
    }

    #[test]
    fn test_patterns() {
        assert_eq!(InvalidationPattern::namespace("items").as_str(), "items:*");
        assert_eq!(
            InvalidationPattern::under(CacheKey::new("items").part("all")).as_str(),
            "items:all:*"
        );
        assert_eq!(
            InvalidationPattern::field_prefix(
                CacheKey::new("items").field("company_id", "c1"),
                "items_ids"
            )
            .as_str(),
            "items:company_id=c1:items_ids=*"
        );
    }

    fn ids_and_permutation() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
        proptest::collection::vec("[a-f0-9]{1,8}", 0..12)
            .prop_flat_map(|ids| (Just(ids.clone()), Just(ids).prop_shuffle()))
    }

    proptest! {
        #[test]
        fn prop_id_set_invariant_under_permutation((ids, shuffled) in ids_and_permutation()) {
            let original = CacheKey::new("items").id_set("items_ids", &ids).into_string();
            let permuted = CacheKey::new("items").id_set("items_ids", &shuffled).into_string();
            prop_assert_eq!(original, permuted);
        }
    }
}
