//! Per-resource-type cache lifetimes.

use std::collections::HashMap;
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

/// Built-in lifetimes: volatile data gets seconds, near-static data gets hours.
const BUILT_IN: &[(&str, Duration)] = &[
    ("regions", HOUR),
    ("organizations", Duration::from_secs(10 * 60)),
    ("projects", Duration::from_secs(5 * 60)),
    ("branches", MINUTE),
    ("endpoints", MINUTE),
    ("databases", MINUTE),
    ("roles", MINUTE),
    ("operations", Duration::from_secs(10)),
    ("connections", Duration::from_secs(10)),
];

/// Maps resource types (cache key namespaces) to TTLs.
///
/// Types without an entry fall back to the cache's default TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlTable {
    entries: HashMap<String, Duration>,
}

impl TtlTable {
    /// A table with no entries; everything uses the cache default.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds or replaces the TTL for `resource_type`.
    pub fn with(mut self, resource_type: impl Into<String>, ttl: Duration) -> Self {
        self.entries.insert(resource_type.into(), ttl);
        self
    }

    pub fn get(&self, resource_type: &str) -> Option<Duration> {
        self.entries.get(resource_type).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TtlTable {
    fn default() -> Self {
        BUILT_IN
            .iter()
            .fold(Self::empty(), |table, (kind, ttl)| table.with(*kind, *ttl))
    }
}
