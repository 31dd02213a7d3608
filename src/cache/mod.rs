//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration and LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Process-wide cache handle. Every operation takes the lock, runs to
/// completion and releases it; the lock is never held across network I/O.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

/// Wraps a store into a shared handle.
pub fn shared<V>(store: CacheStore<V>) -> SharedCache<V> {
    Arc::new(RwLock::new(store))
}
