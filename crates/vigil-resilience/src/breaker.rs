use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Observable state of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally; failures are counted.
    Closed,
    /// Calls are rejected until the recovery timeout elapses.
    Open,
    /// Recovery timeout elapsed; calls flow again until the next
    /// success (→ Closed) or failure (→ Open).
    HalfOpen,
}

struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Per-dependency circuit breaker.
///
/// Open is entered once `failure_count` reaches the threshold without
/// an intervening success. Open decays to HalfOpen lazily, on the first
/// state read after `recovery_timeout` has elapsed since the last
/// recorded failure — there is no background timer.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    recovery_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            recovery_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_time: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, applying the Open → HalfOpen decay if due.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.state
    }

    /// Whether a call should be attempted right now.
    /// True in Closed and HalfOpen, false in Open.
    pub fn can_execute(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Record a successful call: reset the failure count and force
    /// Closed, from any prior state.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(breaker = %self.name, "Circuit closed after success");
        }
        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
    }

    /// Record a failed call: bump the count, stamp the failure time,
    /// and open the circuit if the threshold is reached.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.failure_count += 1;
        inner.last_failure_time = Some(Instant::now());
        if inner.failure_count >= self.failure_threshold {
            if inner.state != CircuitState::Open {
                warn!(
                    breaker = %self.name,
                    failures = inner.failure_count,
                    "Circuit opened"
                );
            }
            inner.state = CircuitState::Open;
        }
    }

    fn refresh(&self, inner: &mut BreakerInner) {
        if inner.state == CircuitState::Open {
            if let Some(last) = inner.last_failure_time {
                if last.elapsed() >= self.recovery_timeout {
                    inner.state = CircuitState::HalfOpen;
                    info!(breaker = %self.name, "Circuit half-open, probing");
                }
            }
        }
    }
}
