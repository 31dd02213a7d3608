//! Configuration Module
//!
//! Loads cache, retry, circuit breaker and API settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ApiError, Result};

/// Cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of entries
    pub max_size: usize,
    /// TTL applied when a caller does not pick one
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 100,
            default_ttl: Duration::from_secs(300),
        }
    }
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    /// Failures needed to open the circuit
    pub threshold: u32,
    /// How long the circuit stays open before a probe is allowed
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 5,
            cooldown: Duration::from_millis(30_000),
        }
    }
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// Deadline for a single attempt
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_millis(30_000),
        }
    }
}

/// Complete configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub api: ApiConfig,
    /// Port for the diagnostics HTTP server
    pub diagnostics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            api: ApiConfig::default(),
            diagnostics_port: 3000,
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED`, `CACHE_MAX_SIZE`, `CACHE_DEFAULT_TTL_SECS`
    /// - `RETRY_ENABLED`, `RETRY_MAX_ATTEMPTS`, `RETRY_INITIAL_DELAY_MS`,
    ///   `RETRY_MAX_DELAY_MS`, `RETRY_BACKOFF_MULTIPLIER`
    /// - `CIRCUIT_BREAKER_ENABLED`, `CIRCUIT_BREAKER_THRESHOLD`, `CIRCUIT_BREAKER_COOLDOWN_MS`
    /// - `API_BASE_URL`, `API_REQUEST_TIMEOUT_MS`
    /// - `DIAGNOSTICS_PORT` (default: 3000)
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Self {
            cache: CacheConfig {
                enabled: parse_bool(lookup("CACHE_ENABLED"), defaults.cache.enabled),
                max_size: parse_or(lookup("CACHE_MAX_SIZE"), defaults.cache.max_size),
                default_ttl: lookup("CACHE_DEFAULT_TTL_SECS")
                    .and_then(|v| v.trim().parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.cache.default_ttl),
            },
            retry: RetryConfig {
                enabled: parse_bool(lookup("RETRY_ENABLED"), defaults.retry.enabled),
                max_attempts: parse_or(lookup("RETRY_MAX_ATTEMPTS"), defaults.retry.max_attempts),
                initial_delay: parse_millis(
                    lookup("RETRY_INITIAL_DELAY_MS"),
                    defaults.retry.initial_delay,
                ),
                max_delay: parse_millis(lookup("RETRY_MAX_DELAY_MS"), defaults.retry.max_delay),
                backoff_multiplier: parse_or(
                    lookup("RETRY_BACKOFF_MULTIPLIER"),
                    defaults.retry.backoff_multiplier,
                ),
            },
            circuit_breaker: CircuitBreakerConfig {
                enabled: parse_bool(
                    lookup("CIRCUIT_BREAKER_ENABLED"),
                    defaults.circuit_breaker.enabled,
                ),
                threshold: parse_or(
                    lookup("CIRCUIT_BREAKER_THRESHOLD"),
                    defaults.circuit_breaker.threshold,
                ),
                cooldown: parse_millis(
                    lookup("CIRCUIT_BREAKER_COOLDOWN_MS"),
                    defaults.circuit_breaker.cooldown,
                ),
            },
            api: ApiConfig {
                base_url: lookup("API_BASE_URL")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or(defaults.api.base_url),
                request_timeout: parse_millis(
                    lookup("API_REQUEST_TIMEOUT_MS"),
                    defaults.api.request_timeout,
                ),
            },
            diagnostics_port: parse_or(lookup("DIAGNOSTICS_PORT"), defaults.diagnostics_port),
        }
    }

    /// Rejects values the orchestrator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_size == 0 {
            return Err(ApiError::Config("cache max size must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ApiError::Config("retry max attempts must be at least 1".to_string()));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(ApiError::Config(format!(
                "retry backoff multiplier must be a finite number >= 1.0, got {}",
                self.retry.backoff_multiplier
            )));
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(ApiError::Config(format!(
                "retry initial delay {:?} exceeds max delay {:?}",
                self.retry.initial_delay, self.retry.max_delay
            )));
        }
        if self.api.request_timeout.is_zero() {
            return Err(ApiError::Config(
                "API request timeout must be greater than zero".to_string(),
            ));
        }
        if self.circuit_breaker.threshold == 0 {
            return Err(ApiError::Config(
                "circuit breaker threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_millis(raw: Option<String>, default: Duration) -> Duration {
    raw.and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
