//! Generic resilience primitives used by the orchestrator and agents.
//!
//! - [`CircuitBreaker`] — stops calling a failing dependency until it
//!   has had time to recover.
//! - [`RetryPolicy`] / [`RetryExecutor`] — deterministic
//!   exponential-backoff retries (no jitter).
//! - [`GracefulShutdown`] — signal handling plus reverse-order cleanup
//!   callbacks.

pub mod breaker;
pub mod retry;
pub mod shutdown;

pub use breaker::{CircuitBreaker, CircuitState};
pub use retry::{RetryExecutor, RetryPolicy};
pub use shutdown::GracefulShutdown;
