//! In-process store backed by `DashMap`, with lazy per-entry expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;

use crate::cache::{CacheError, KeyValueStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl_seconds: Option<u64>) -> Result<Self, CacheError> {
        let expires_at = ttl_seconds.map(expiry_after).transpose()?;
        Ok(Self { value, expires_at })
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// In-memory key/value store.
///
/// Expired entries are dropped when they are next touched, the same lazy
/// policy Redis applies on access.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expire every entry now, as if its TTL had run out.
    #[cfg(test)]
    pub(crate) fn expire_all(&self) {
        let now = Instant::now();
        for mut entry in self.entries.iter_mut() {
            entry.expires_at = Some(now);
        }
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        None
    }
}

fn expiry_after(ttl_seconds: u64) -> Result<Instant, CacheError> {
    Instant::now()
        .checked_add(Duration::from_secs(ttl_seconds))
        .ok_or_else(|| CacheError::Operation(format!("invalid expire time: {ttl_seconds}s")))
}

/// Translate a Redis-style glob into an anchored regex.
///
/// Follows `SCAN MATCH`: `*`, `?`, `\` escapes and `[...]` classes with
/// `^` negation and `a-z` ranges. An unterminated class runs to the end of
/// the pattern and a trailing `\` is literal.
pub(crate) fn glob_to_regex(pattern: &str) -> Result<Regex, CacheError> {
    let mut expr = String::with_capacity(pattern.len() + 6);
    expr.push_str("(?s)^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                expr.push_str(&regex::escape(&literal.to_string()));
            }
            '[' => push_class(&mut expr, &mut chars),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|e| CacheError::Operation(format!("invalid pattern {pattern}: {e}")))
}

fn push_class(expr: &mut String, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let negated = chars.next_if_eq(&'^').is_some();
    let mut ranges: Vec<(char, char)> = Vec::new();
    while let Some(c) = chars.next() {
        let start = match c {
            ']' => break,
            '\\' => chars.next().unwrap_or('\\'),
            other => other,
        };
        // `a-z`; a `-` right before `]` or the end is literal.
        let mut lookahead = chars.clone();
        match (lookahead.next(), lookahead.next()) {
            (Some('-'), Some(end)) if end != ']' => {
                chars.next();
                chars.next();
                ranges.push((start.min(end), start.max(end)));
            }
            _ => ranges.push((start, start)),
        }
    }

    match (ranges.is_empty(), negated) {
        // `[]` matches nothing, `[^]` matches any character.
        (true, false) => expr.push_str(r"\b\B"),
        (true, true) => expr.push('.'),
        (false, _) => {
            expr.push('[');
            if negated {
                expr.push('^');
            }
            for (lo, hi) in ranges {
                expr.push_str(&regex::escape(&lo.to_string()));
                if lo != hi {
                    expr.push('-');
                    expr.push_str(&regex::escape(&hi.to_string()));
                }
            }
            expr.push(']');
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.live_value(key))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), Entry::new(value, ttl_seconds)?);
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        Ok(keys.iter().map(|key| self.live_value(key)).collect())
    }

    async fn mset(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        // All or nothing, like a pipelined MSET.
        let entries = entries
            .into_iter()
            .map(|(key, value)| Ok((key, Entry::new(value, ttl_seconds)?)))
            .collect::<Result<Vec<_>, CacheError>>()?;
        for (key, entry) in entries {
            self.entries.insert(key, entry);
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| !entry.is_expired())
            .count();
        Ok(removed as u64)
    }

    fn scan<'a>(&'a self, pattern: &'a str) -> BoxStream<'a, Result<String, CacheError>> {
        let matcher = match glob_to_regex(pattern) {
            Ok(matcher) => matcher,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired() && matcher.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        stream::iter(keys.into_iter().map(Ok)).boxed()
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();
        store.set("key", "value".to_string(), None).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
        assert_eq!(store.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let store = MemoryStore::new();
        store.set("key", "value".to_string(), Some(1)).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.get("key").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_counts_only_removed_keys() {
        let store = MemoryStore::new();
        store.set("a", "1".to_string(), None).await.unwrap();
        store.set("b", "2".to_string(), None).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(store.delete(&keys).await.unwrap(), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_scan_matches_glob() {
        let store = MemoryStore::new();
        for key in ["items:all:offset=0:limit=10", "items:company_id=1:item_id=2", "companies:all"] {
            store.set(key, "x".to_string(), None).await.unwrap();
        }

        let mut keys: Vec<String> = store.scan("items:*").try_collect().await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec!["items:all:offset=0:limit=10", "items:company_id=1:item_id=2"]
        );
    }

    #[tokio::test]
    async fn test_overflowing_ttl_is_an_error() {
        let store = MemoryStore::new();
        let err = store.set("k", "v".to_string(), Some(u64::MAX)).await.unwrap_err();
        assert!(matches!(err, CacheError::Operation(_)));

        let entries = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        assert!(store.mset(entries, Some(u64::MAX)).await.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_glob_character_classes() {
        let re = glob_to_regex("items:[ab]?").unwrap();
        assert!(re.is_match("items:a1"));
        assert!(re.is_match("items:b2"));
        assert!(!re.is_match("items:c3"));

        let range = glob_to_regex("v[0-9]").unwrap();
        assert!(range.is_match("v7"));
        assert!(!range.is_match("vx"));

        let negated = glob_to_regex("v[^0-9]").unwrap();
        assert!(negated.is_match("vx"));
        assert!(!negated.is_match("v7"));

        let reversed = glob_to_regex("[z-a]").unwrap();
        assert!(reversed.is_match("m"));

        // Escaped and trailing `-` are literal members.
        let literal = glob_to_regex(r"[\]a-]").unwrap();
        assert!(literal.is_match("]"));
        assert!(literal.is_match("-"));
        assert!(!literal.is_match("b"));

        assert!(!glob_to_regex("x[]").unwrap().is_match("x"));
        assert!(glob_to_regex("x[^]").unwrap().is_match("xy"));
        assert!(glob_to_regex("x[ab").unwrap().is_match("xb"));
        assert!(glob_to_regex(r"end\").unwrap().is_match(r"end\"));
    }

    #[tokio::test]
    async fn test_scan_with_class_matches_redis_semantics() {
        let store = MemoryStore::new();
        for key in ["user:1", "user:2", "user:9"] {
            store.set(key, "x".to_string(), None).await.unwrap();
        }
        let mut keys: Vec<String> = store.scan("user:[1-2]").try_collect().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["user:1", "user:2"]);
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("user:?:*").unwrap();
        assert!(re.is_match("user:a:b"));
        assert!(!re.is_match("user:ab:c"));

        let literal = glob_to_regex(r"a.b\*").unwrap();
        assert!(literal.is_match("a.b*"));
        assert!(!literal.is_match("axb*"));
        assert!(!literal.is_match("a.bc"));
    }
}
