//! Response DTOs for the diagnostics API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::resilience::CircuitState;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" while the circuit is open
    pub status: String,
    pub circuit_state: CircuitState,
    pub circuit_open: bool,
    pub failure_count: u32,
    pub max_attempts: u32,
    pub cache_size: usize,
    pub cache_enabled: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(
        circuit_state: CircuitState,
        failure_count: u32,
        max_attempts: u32,
        cache_size: usize,
        cache_enabled: bool,
    ) -> Self {
        let circuit_open = circuit_state == CircuitState::Open;
        Self {
            status: if circuit_open { "degraded" } else { "healthy" }.to_string(),
            circuit_state,
            circuit_open,
            failure_count,
            max_attempts,
            cache_size,
            cache_enabled,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for POST /circuit/reset
#[derive(Debug, Clone, Serialize)]
pub struct CircuitResponse {
    pub message: String,
    pub circuit_state: CircuitState,
}

impl CircuitResponse {
    pub fn reset(circuit_state: CircuitState) -> Self {
        Self {
            message: "Circuit breaker reset".to_string(),
            circuit_state,
        }
    }
}

/// Response body for the cache invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(scope: impl AsRef<str>, removed: usize) -> Self {
        Self {
            message: format!("Invalidated {} cache entries for '{}'", removed, scope.as_ref()),
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_healthy() {
        let resp = HealthResponse::new(CircuitState::Closed, 0, 3, 12, true);
        assert_eq!(resp.status, "healthy");
        assert!(!resp.circuit_open);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["circuit_state"], "closed");
        assert_eq!(json["cache_size"], 12);
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_health_response_degraded_when_open() {
        let resp = HealthResponse::new(CircuitState::Open, 5, 3, 0, true);
        assert_eq!(resp.status, "degraded");
        assert!(resp.circuit_open);
    }

    #[test]
    fn test_stats_response_from_cache_stats() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            evictions: 5,
            expirations: 2,
            total_entries: 40,
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.evictions, 5);
        assert_eq!(resp.total_entries, 40);
    }

    #[test]
    fn test_invalidate_response_message() {
        let resp = InvalidateResponse::new("projects", 3);
        assert_eq!(resp.removed, 3);
        assert!(resp.message.contains("projects"));
    }
}
