//! Session-scoped response store
//!
//! Backed by a `DashMap` so the transport and the invalidation policy can
//! share one store through an `Arc` without an outer lock. Every operation is
//! synchronous: an invalidation has fully completed by the time the call
//! returns, so a mutation issued afterwards can never race a stale entry.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::stats::{AtomicCacheMetrics, CacheStats};

#[derive(Debug)]
struct StoredResponse {
    body: Bytes,
    inserted_at: Instant,
    /// Monotonic insert order for oldest-first eviction
    sequence: u64,
}

/// Process-wide result cache keyed by exact endpoint string
#[derive(Debug)]
pub struct ResultCache {
    storage: DashMap<CacheKey, StoredResponse>,
    config: CacheConfig,
    next_sequence: AtomicU64,
    metrics: AtomicCacheMetrics,
}

impl ResultCache {
    /// Create an empty cache; fails on an invalid configuration
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        config.validate()?;

        Ok(Self {
            storage: DashMap::new(),
            config: config.clone(),
            next_sequence: AtomicU64::new(0),
            metrics: AtomicCacheMetrics::default(),
        })
    }

    /// Limits the cache was created with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn is_expired(&self, entry: &StoredResponse) -> bool {
        self.config
            .ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }

    /// Look up a cached body; expired entries are dropped and count as a miss.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let expired = match self.storage.get(key) {
            Some(entry) if !self.is_expired(&entry) => {
                self.metrics.record_hit();
                debug!("Cache hit: {}", key);
                return Some(entry.body.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && self.storage.remove(key).is_some() {
            self.metrics.record_eviction();
            debug!("Cache entry expired: {}", key);
        }

        self.metrics.record_miss();
        debug!("Cache miss: {}", key);
        None
    }

    /// Store a body, replacing any previous entry at the same key.
    pub fn put(&self, key: CacheKey, body: Bytes) {
        if let Some(max_entries) = self.config.max_entries {
            while !self.storage.contains_key(&key) && self.storage.len() >= max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        debug!("Cache store: {} ({} bytes)", key, body.len());
        self.storage.insert(
            key,
            StoredResponse {
                body,
                inserted_at: Instant::now(),
                sequence,
            },
        );
        self.metrics.record_insert();
    }

    /// Remove one entry; returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.storage.remove(key).is_some();
        if removed {
            self.metrics.record_removal();
        }
        removed
    }

    /// Whether a live entry exists; does not touch the hit/miss counters
    pub fn contains(&self, key: &str) -> bool {
        self.storage
            .get(key)
            .is_some_and(|entry| !self.is_expired(&entry))
    }

    /// Keys currently held, in no particular order.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.storage.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of entries held, expired ones included until looked up
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether no entries are held
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.storage.len())
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .storage
            .iter()
            .min_by_key(|entry| entry.value().sequence)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => {
                if self.storage.remove(&key).is_some() {
                    self.metrics.record_eviction();
                    debug!("Cache evicted: {}", key);
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache(config: &CacheConfig) -> ResultCache {
        ResultCache::new(config).expect("valid config")
    }

    #[test]
    fn test_put_get_remove() {
        let cache = cache(&CacheConfig::default());
        let key = CacheKey::from("/experiments?id=1");

        assert!(cache.get(key.as_str()).is_none());
        cache.put(key.clone(), Bytes::from_static(b"{\"id\":1}"));
        assert_eq!(
            cache.get(key.as_str()),
            Some(Bytes::from_static(b"{\"id\":1}"))
        );

        assert!(cache.remove(key.as_str()));
        assert!(!cache.remove(key.as_str()));
        assert!(cache.is_empty());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.removals, 1);
    }

    #[test]
    fn test_keys_are_byte_exact() {
        let cache = cache(&CacheConfig::default());
        cache.put(
            CacheKey::from("/experiments?admin&limit=50"),
            Bytes::from_static(b"[]"),
        );
        assert!(cache.contains("/experiments?admin&limit=50"));
        assert!(!cache.contains("/experiments?limit=50&admin"));
        assert!(!cache.contains("/experiments?admin"));
    }

    #[test]
    fn test_put_replaces_existing() {
        let cache = cache(&CacheConfig::default());
        cache.put(CacheKey::from("k"), Bytes::from_static(b"a"));
        cache.put(CacheKey::from("k"), Bytes::from_static(b"b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(Bytes::from_static(b"b")));
    }

    #[test]
    fn test_max_entries_evicts_oldest() {
        let cache = cache(&CacheConfig::default().with_max_entries(2));
        cache.put(CacheKey::from("a"), Bytes::from_static(b"1"));
        cache.put(CacheKey::from("b"), Bytes::from_static(b"2"));
        cache.put(CacheKey::from("c"), Bytes::from_static(b"3"));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_replacing_at_capacity_does_not_evict() {
        let cache = cache(&CacheConfig::default().with_max_entries(2));
        cache.put(CacheKey::from("a"), Bytes::from_static(b"1"));
        cache.put(CacheKey::from("b"), Bytes::from_static(b"2"));
        cache.put(CacheKey::from("a"), Bytes::from_static(b"3"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = cache(&CacheConfig::default().with_ttl(Duration::from_millis(20)));
        cache.put(CacheKey::from("k"), Bytes::from_static(b"v"));
        assert!(cache.contains("k"));

        std::thread::sleep(Duration::from_millis(40));

        assert!(!cache.contains("k"));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_clear() {
        let cache = cache(&CacheConfig::default());
        cache.put(CacheKey::from("a"), Bytes::from_static(b"1"));
        cache.put(CacheKey::from("b"), Bytes::from_static(b"2"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(ResultCache::new(&CacheConfig::default().with_max_entries(0)).is_err());
    }
}
