//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to remote API:
//!     → retry.rs (ask the breaker, run the attempt, back off on transient failure)
//!     → circuit_breaker.rs (count failures, open after threshold, probe after cooldown)
//! ```
//!
//! The breaker is shared per remote dependency; the retry handler holds a handle to it.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use retry::{RetryHandler, RetryHook, RetryPolicy};
