//! Retry logic.
//!
//! # Responsibilities
//! - Run an operation up to `max_attempts` times
//! - Consult the circuit breaker before every attempt and report each outcome to it
//! - Wait between attempts with deterministic exponential backoff, capped at `max_delay`
//! - Stop immediately on failures that are not worth retrying
//!
//! An open circuit fails fast with [`ApiError::CircuitOpen`] and never consumes
//! the retry budget.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{ApiError, Result};
use crate::resilience::CircuitBreaker;

/// Observer invoked before each wait, with the failure and the attempt that produced it.
pub type RetryHook = Arc<dyn Fn(&ApiError, u32) + Send + Sync>;

// == Retry Policy ==
/// Immutable retry configuration.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
    on_retry: Option<RetryHook>,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1; a multiplier that is not a finite
    /// number >= 1.0 is treated as 1.0.
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        let backoff_multiplier = if backoff_multiplier.is_finite() && backoff_multiplier >= 1.0 {
            backoff_multiplier
        } else {
            1.0
        };
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier,
            max_delay,
            on_retry: None,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.initial_delay,
            config.backoff_multiplier,
            config.max_delay,
        )
    }

    /// Attaches an observer called before every retry wait.
    pub fn with_on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ApiError, u32) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Delay after the first failed attempt.
    pub fn first_delay(&self) -> Duration {
        self.initial_delay.min(self.max_delay)
    }

    /// Delay following `current`: multiplied, then clamped to `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next = current.as_secs_f64() * self.backoff_multiplier;
        Duration::from_secs_f64(next.min(self.max_delay.as_secs_f64()))
    }

    /// The waits between consecutive attempts, `max_attempts - 1` of them.
    pub fn delays(&self) -> Vec<Duration> {
        let waits = self.max_attempts.saturating_sub(1) as usize;
        std::iter::successors(Some(self.first_delay()), |d| Some(self.next_delay(*d)))
            .take(waits)
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("max_delay", &self.max_delay)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

// == Retry Handler ==
/// Runs operations under a [`RetryPolicy`], gated by a shared [`CircuitBreaker`].
#[derive(Debug, Clone)]
pub struct RetryHandler {
    policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    enabled: bool,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            policy,
            breaker,
            enabled: true,
        }
    }

    pub fn from_config(config: &RetryConfig, breaker: Arc<CircuitBreaker>) -> Self {
        let mut handler = Self::new(RetryPolicy::from_config(config), breaker);
        handler.enabled = config.enabled;
        handler
    }

    /// Turns retrying on or off. When off, operations run exactly once.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    // == Execute ==
    /// Runs `operation` until it succeeds, fails for good, or the attempts run out.
    ///
    /// Returns the last error when giving up.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.enabled {
            return operation().await;
        }

        let max_attempts = self.policy.max_attempts;
        let mut delay = self.policy.first_delay();
        let mut attempt = 1;

        loop {
            // A rejected attempt is not reported back to the breaker.
            if !self.breaker.allow_request() {
                debug!(attempt, "circuit breaker open, failing fast");
                return Err(ApiError::CircuitOpen);
            }

            let err = match operation().await {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(err) => err,
            };

            self.breaker.record_failure();

            if attempt >= max_attempts {
                if max_attempts > 1 {
                    warn!(attempts = attempt, error = %err, "giving up after retries");
                }
                return Err(err);
            }
            if !err.is_retryable() {
                debug!(attempt, code = err.code(), "failure is not retryable");
                return Err(err);
            }

            if let Some(hook) = &self.policy.on_retry {
                hook(&err, attempt);
            }
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );

            tokio::time::sleep(delay).await;
            delay = self.policy.next_delay(delay);
            attempt += 1;
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
