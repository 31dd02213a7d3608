//! Circuit breaker guarding the remote API.
//!
//! # States
//! - Closed: normal operation, requests pass through, failures are counted
//! - Open: remote assumed down, requests fail fast
//! - Half-Open: cooldown elapsed, the next outcome decides recovery. Until
//!   that outcome is recorded every caller is let through, so concurrent
//!   callers may all act as probes.
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: allow_request() called after the cooldown elapsed
//! Half-Open → Closed: success recorded
//! Half-Open → Open: failure recorded (counter is still >= threshold)
//! ```
//!
//! The cooldown is checked when `allow_request()` runs; there is no timer.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::clock::{SharedClock, SystemClock};
use crate::config::CircuitBreakerConfig;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_at: None,
        }
    }
}

/// One breaker per remote dependency, shared behind an `Arc`.
///
/// All mutation happens under a single lock that is never held across an await.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerState>,
    threshold: u32,
    cooldown: Duration,
    enabled: bool,
    clock: SharedClock,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self::with_clock(threshold, cooldown, SystemClock::shared())
    }

    pub fn with_clock(threshold: u32, cooldown: Duration, clock: SharedClock) -> Self {
        Self {
            inner: Mutex::new(BreakerState::closed()),
            threshold,
            cooldown,
            enabled: true,
            clock,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig, clock: SharedClock) -> Self {
        let mut breaker = Self::with_clock(config.threshold, config.cooldown, clock);
        breaker.enabled = config.enabled;
        breaker
    }

    /// A breaker that lets everything through and records nothing.
    pub fn disabled() -> Self {
        let mut breaker = Self::new(u32::MAX, Duration::ZERO);
        breaker.enabled = false;
        breaker
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // A panic while holding the lock cannot leave the counters half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // == Allow Request ==
    /// Whether an attempt may proceed.
    ///
    /// Returns false only while open with the cooldown unexpired. Once the
    /// cooldown has elapsed this call itself moves the breaker to half-open.
    pub fn allow_request(&self) -> bool {
        if !self.enabled {
            return true;
        }

        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let now = self.clock.now();
                let cooled_down = inner
                    .last_failure_at
                    .map_or(true, |at| now.saturating_duration_since(at) >= self.cooldown);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    info!("circuit breaker half-open, allowing probe request");
                }
                cooled_down
            }
        }
    }

    // == Record Success ==
    pub fn record_success(&self) {
        if !self.enabled {
            return;
        }

        let mut inner = self.lock();
        inner.failure_count = 0;
        if inner.state != CircuitState::Closed {
            info!(from = %inner.state, "circuit breaker closed");
            inner.state = CircuitState::Closed;
        }
    }

    // == Record Failure ==
    pub fn record_failure(&self) {
        if !self.enabled {
            return;
        }

        let mut inner = self.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_at = Some(self.clock.now());

        if inner.failure_count >= self.threshold && inner.state != CircuitState::Open {
            warn!(
                failures = inner.failure_count,
                threshold = self.threshold,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "circuit breaker opened"
            );
            inner.state = CircuitState::Open;
        }
    }

    // == Reset ==
    /// Hard reset to closed with no recorded failures.
    pub fn reset(&self) {
        let mut inner = self.lock();
        *inner = BreakerState::closed();
        info!("circuit breaker reset");
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
