// Cache manager - namespaced TTL cache with insertion-order eviction
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{percentage, CacheConfig, CacheEntry, CacheStats};
use crate::metrics;
use lru::LruCache;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Generic key/value cache for memoized responses.
///
/// Entries expire after their TTL and are removed lazily when read. The store
/// is capacity-bounded: inserting a new key into a full cache evicts the
/// oldest inserted entry. Reads use `peek` so they never reorder the store,
/// which keeps the LRU order equal to insertion order.
pub struct CacheManager {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    store: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            inner: Mutex::new(CacheInner {
                store: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Generate a namespaced SHA256 key from request parameters.
    ///
    /// Object keys are sorted before hashing, so structurally equal params
    /// always produce the same key.
    pub fn generate_key<T: Serialize + ?Sized>(namespace: &str, params: &T) -> String {
        let value = serde_json::to_value(params).unwrap_or_else(|e| {
            debug!("Cache key params failed to serialize: {}", e);
            Value::Null
        });

        let mut hasher = Sha256::new();
        hasher.update(canonical_json(&value).as_bytes());

        format!("{}:{}", namespace, hex::encode(hasher.finalize()))
    }

    /// Store a value with the default TTL
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.set_with_ttl(key, value, self.config.ttl());
    }

    /// Store a value with an explicit TTL
    pub fn set_with_ttl(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let key = key.into();
        let mut inner = self.inner.lock();

        if let Some((old_key, _)) = inner.store.push(key.clone(), CacheEntry::new(value, ttl)) {
            if old_key != key {
                debug!("Cache eviction triggered, removed {}", old_key);
                metrics::record_cache_operation("response", "eviction");
            }
        }

        debug!("Cache set: {} (ttl {}s, size {})", key, ttl.as_secs(), inner.store.len());
    }

    /// Retrieve a value, removing it if it has expired
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let CacheInner { store, hits, misses } = &mut *inner;

        let expired = match store.peek_mut(key) {
            None => {
                *misses += 1;
                metrics::record_cache_operation("response", "miss");
                return None;
            }
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.hit_count += 1;
                *hits += 1;
                debug!(
                    "Cache hit: {} (entry hits {}, hit rate {:.1}%)",
                    key,
                    entry.hit_count,
                    percentage(*hits as f64, (*hits + *misses) as f64)
                );
                metrics::record_cache_operation("response", "hit");
                return Some(entry.value.clone());
            }
        };

        if expired {
            store.pop(key);
            *misses += 1;
            debug!("Cache expired: {}", key);
            metrics::record_cache_operation("response", "miss");
        }
        None
    }

    /// Remove a single entry
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.lock().store.pop(key).is_some();
        debug!("Cache entry deleted: {} (present: {})", key, removed);
        removed
    }

    /// Clear all cached entries and reset hit/miss counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.store.clear();
        inner.hits = 0;
        inner.misses = 0;
        info!("Response cache cleared");
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let size = inner.store.len();
        CacheStats {
            size,
            max_size: self.config.max_size,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: percentage(inner.hits as f64, (inner.hits + inner.misses) as f64),
            utilization_percent: percentage(size as f64, self.config.max_size as f64),
        }
    }

    /// Keys matching a wildcard pattern, oldest first.
    ///
    /// `*` matches any run of characters and `?` a single character; the
    /// pattern must match the whole key.
    pub fn get_keys_by_pattern(&self, pattern: &str) -> Vec<String> {
        let Some(regex) = glob_to_regex(pattern) else {
            return Vec::new();
        };

        self.inner
            .lock()
            .store
            .iter()
            .rev()
            .filter(|(k, _)| regex.is_match(k))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Number of live and not-yet-swept entries
    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serialize JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_cache(max_size: usize) -> CacheManager {
        CacheManager::new(CacheConfig {
            ttl_seconds: 60,
            max_size,
        })
    }

    #[test]
    fn test_cache_key_generation() {
        let key1 = CacheManager::generate_key("health-analysis", &json!({"a": 1, "b": [1, 2]}));
        let key2 = CacheManager::generate_key("health-analysis", &json!({"b": [1, 2], "a": 1}));

        // Same params in any key order produce the same key
        assert_eq!(key1, key2);
        assert!(key1.starts_with("health-analysis:"));
        assert_eq!(key1.len(), "health-analysis:".len() + 64);

        // Different namespace or values produce different keys
        let key3 = CacheManager::generate_key("localize", &json!({"a": 1, "b": [1, 2]}));
        let key4 = CacheManager::generate_key("health-analysis", &json!({"a": 1, "b": [2, 1]}));
        assert_ne!(key1, key3);
        assert_ne!(key1, key4);
    }

    #[test]
    fn test_canonical_json_sorts_nested_objects() {
        let value = json!({"z": {"y": 1, "x": 2}, "a": [{"d": 1, "c": 2}]});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":[{"c":2,"d":1}],"z":{"x":2,"y":1}}"#
        );
    }

    #[test]
    fn test_insertion_order_eviction() {
        let cache = small_cache(2);
        cache.set("A", json!(1));
        cache.set("B", json!(2));
        cache.set("C", json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("A"), None);
        assert_eq!(cache.get("B"), Some(json!(2)));
        assert_eq!(cache.get("C"), Some(json!(3)));
    }

    #[test]
    fn test_reads_do_not_protect_from_eviction() {
        let cache = small_cache(2);
        cache.set("A", json!(1));
        cache.set("B", json!(2));

        // Reading A does not make it younger than B
        assert!(cache.get("A").is_some());
        cache.set("C", json!(3));

        assert_eq!(cache.get("A"), None);
        assert!(cache.get("B").is_some());
    }

    #[test]
    fn test_glob_patterns() {
        let cache = small_cache(10);
        cache.set("health:abc", json!(1));
        cache.set("health:def", json!(2));
        cache.set("localize:abc", json!(3));

        assert_eq!(cache.get_keys_by_pattern("health:*"), vec!["health:abc", "health:def"]);
        assert_eq!(cache.get_keys_by_pattern("*:abc"), vec!["health:abc", "localize:abc"]);
        assert_eq!(cache.get_keys_by_pattern("health:d?f"), vec!["health:def"]);
        assert!(cache.get_keys_by_pattern("health").is_empty());
        assert_eq!(cache.get_keys_by_pattern("*").len(), 3);
    }
}
