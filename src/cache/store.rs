//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::clock::{SharedClock, SystemClock};
use crate::config::CacheConfig;

// == Cache Store ==
/// Bounded LRU store with per-entry TTL.
///
/// There is no background sweeper: validity is re-checked against the clock on
/// every read, and expired entries are removed at that moment. While disabled
/// the store holds nothing.
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    stats: CacheStats,
    max_size: usize,
    default_ttl: Duration,
    enabled: bool,
    clock: SharedClock,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an enabled store reading time from the system clock.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Lifetime applied when `set` is called without a TTL
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, default_ttl, SystemClock::shared())
    }

    /// Creates an enabled store reading time from `clock`.
    pub fn with_clock(max_size: usize, default_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_size,
            default_ttl,
            enabled: true,
            clock,
        }
    }

    /// Creates a store from configuration, honoring its `enabled` flag.
    pub fn from_config(config: &CacheConfig, clock: SharedClock) -> Self {
        let mut store = Self::with_clock(config.max_size, config.default_ttl, clock);
        store.enabled = config.enabled;
        store
    }

    // == Get ==
    /// Returns a clone of the value if present and still valid.
    ///
    /// A hit refreshes the entry's LRU recency. An expired entry is removed
    /// and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }

        if !self.check_valid(key) {
            self.stats.record_miss();
            return None;
        }

        let value = self.entries.get(key).map(|entry| entry.data.clone());
        self.stats.record_hit();
        self.lru.touch(key);
        value
    }

    // == Has ==
    /// Reports whether a valid entry exists, removing it if expired.
    pub fn has(&mut self, key: &str) -> bool {
        self.enabled && self.check_valid(key)
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry for the key.
    ///
    /// Refreshes LRU recency. If a new key arrives while the cache is full, the
    /// least recently used entry is evicted first. No-op while disabled.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        if !self.enabled || self.max_size == 0 {
            return;
        }

        let key = key.into();
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_size {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
                debug!(key = %evicted_key, "evicted least recently used cache entry");
            }
        }

        let entry = CacheEntry::new(value, self.clock.now(), ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Delete ==
    /// Removes an entry. Returns whether one was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
    }

    // == Keys ==
    /// All stored keys, expired or not, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    // == Set Enabled ==
    /// Turns the cache on or off.
    ///
    /// Disabling drops every entry. Re-enabling starts from empty.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.clear();
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Number of stored entries, including ones not yet found expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lazy expiry: true if a valid entry exists, otherwise removes any stale one.
    fn check_valid(&mut self, key: &str) -> bool {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if entry.is_valid(now) => true,
            Some(_) => {
                self.entries.remove(key);
                self.lru.remove(key);
                self.stats.record_expiration();
                self.stats.set_total_entries(self.entries.len());
                debug!(key, "dropped expired cache entry");
                false
            }
            None => false,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(300);

    fn store_with_clock(max_size: usize) -> (CacheStore<String>, Arc<ManualClock>) {
        let clock = ManualClock::shared();
        let store = CacheStore::with_clock(max_size, TTL, clock.clone());
        (store, clock)
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<String> = CacheStore::new(100, TTL);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert!(store.is_enabled());
        assert_eq!(store.max_size(), 100);
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = store_with_clock(100);

        store.set("projects:1", "value1".to_string(), None);

        assert_eq!(store.get("projects:1"), Some("value1".to_string()));
        assert!(store.has("projects:1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = store_with_clock(100);
        assert_eq!(store.get("nonexistent"), None);
        assert!(!store.has("nonexistent"));
    }

    #[test]
    fn test_store_delete() {
        let (mut store, _) = store_with_clock(100);

        store.set("key1", "value1".to_string(), None);
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));

        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_overwrite() {
        let (mut store, _) = store_with_clock(100);

        store.set("key1", "value1".to_string(), None);
        store.set("key1", "value2".to_string(), None);

        assert_eq!(store.get("key1"), Some("value2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_boundary() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_secs(10)));

        clock.advance(Duration::from_millis(9_999));
        assert_eq!(store.get("key1"), Some("value1".to_string()));

        clock.advance(Duration::from_millis(2));
        assert_eq!(store.get("key1"), None);
        // Lazily removed on the failed read
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_default_ttl_used() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key1", "value1".to_string(), None);

        clock.advance(TTL);
        assert!(store.has("key1"));
        clock.advance(Duration::from_millis(1));
        assert!(!store.has("key1"));
    }

    #[test]
    fn test_store_overwrite_refreshes_ttl() {
        let (mut store, clock) = store_with_clock(100);

        store.set("key1", "v1".to_string(), Some(Duration::from_secs(5)));
        clock.advance(Duration::from_secs(4));
        store.set("key1", "v2".to_string(), Some(Duration::from_secs(5)));
        clock.advance(Duration::from_secs(4));

        assert_eq!(store.get("key1"), Some("v2".to_string()));
    }

    #[test]
    fn test_store_lru_eviction() {
        let (mut store, _) = store_with_clock(3);

        store.set("key1", "value1".to_string(), None);
        store.set("key2", "value2".to_string(), None);
        store.set("key3", "value3".to_string(), None);
        store.set("key4", "value4".to_string(), None);

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("key1"), None);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let (mut store, _) = store_with_clock(3);

        store.set("key1", "value1".to_string(), None);
        store.set("key2", "value2".to_string(), None);
        store.set("key3", "value3".to_string(), None);

        store.get("key1");
        store.set("key4", "value4".to_string(), None);

        assert!(store.get("key1").is_some());
        assert_eq!(store.get("key2"), None);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let (mut store, _) = store_with_clock(2);

        store.set("key1", "a".to_string(), None);
        store.set("key2", "b".to_string(), None);
        store.set("key1", "c".to_string(), None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_disable_clears_and_blocks() {
        let (mut store, _) = store_with_clock(100);

        store.set("key1", "value1".to_string(), None);
        store.set_enabled(false);

        assert!(store.is_empty());
        store.set("key2", "value2".to_string(), None);
        assert_eq!(store.get("key2"), None);
        assert!(!store.has("key2"));
        assert!(store.is_empty());

        store.set_enabled(true);
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), None);

        store.set("key3", "value3".to_string(), None);
        assert_eq!(store.get("key3"), Some("value3".to_string()));
    }

    #[test]
    fn test_store_keys_include_expired() {
        let (mut store, clock) = store_with_clock(100);

        store.set("projects:1", "a".to_string(), Some(Duration::from_secs(1)));
        store.set("projects:2", "b".to_string(), None);
        clock.advance(Duration::from_secs(5));

        let mut keys: Vec<&str> = store.keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["projects:1", "projects:2"]);
    }

    #[test]
    fn test_store_clear() {
        let (mut store, _) = store_with_clock(100);

        store.set("a", "1".to_string(), None);
        store.set("b", "2".to_string(), None);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.keys().count(), 0);
    }

    #[test]
    fn test_store_stats() {
        let (mut store, _) = store_with_clock(100);

        store.set("key1", "value1".to_string(), None);
        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_from_config_disabled() {
        let config = CacheConfig {
            enabled: false,
            max_size: 10,
            default_ttl: TTL,
        };
        let mut store: CacheStore<u32> = CacheStore::from_config(&config, ManualClock::shared());

        assert!(!store.is_enabled());
        store.set("k", 1, None);
        assert!(store.is_empty());
    }
}
