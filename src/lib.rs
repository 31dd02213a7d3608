//! Resilient API - request orchestration for a remote management API
//!
//! Wraps outbound calls in a TTL/LRU response cache, a circuit breaker and
//! retry with exponential backoff, and exposes a small diagnostics API.

pub mod api;
pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod resilience;

pub use api::AppState;
pub use cache::{CacheStats, CacheStore};
pub use client::{RequestOptions, RequestOrchestrator};
pub use config::Config;
pub use error::{ApiError, Result};
pub use resilience::{CircuitBreaker, CircuitState, RetryHandler, RetryPolicy};
