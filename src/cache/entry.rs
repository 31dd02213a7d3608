//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value together with the moment it was stored and its lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub data: V,
    /// When the value was stored
    pub stored_at: Instant,
    /// How long the value stays valid
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(data: V, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            data,
            stored_at,
            ttl,
        }
    }

    // == Is Valid ==
    /// Checks whether the entry is still valid at `now`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is still valid;
    /// it expires only once the age strictly exceeds the TTL.
    pub fn is_valid(&self, now: Instant) -> bool {
        self.age(now) <= self.ttl
    }

    // == Is Expired ==
    pub fn is_expired(&self, now: Instant) -> bool {
        !self.is_valid(now)
    }

    // == Age ==
    /// Time since the entry was stored. Zero if `now` precedes `stored_at`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(self.age(now))
    }
}
