use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Type alias for the injectable sleep function used in tests.
#[cfg(test)]
type SleepFn = Box<
    dyn Fn(u64) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> + Send + Sync,
>;

/// Deterministic exponential-backoff retry policy.
///
/// Delays are `min(base_delay_ms * exponential_base^attempt, max_delay_ms)`
/// with no jitter; retry timing is reproducible given the attempt number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first; an operation runs at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
    /// Base delay in milliseconds before the first retry.
    pub base_delay_ms: u64,
    /// Multiplier applied per attempt.
    pub exponential_base: f64,
    /// Cap for the computed delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            exponential_base: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (0-based). Pure.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.base_delay_ms as f64 * self.exponential_base.powi(attempt as i32);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Executes an operation under a [`RetryPolicy`].
///
/// On error the operation is re-invoked up to `max_retries` additional
/// times, sleeping the policy delay between attempts. The first success
/// is returned immediately; once retries are exhausted the last error
/// is returned.
pub struct RetryExecutor {
    policy: RetryPolicy,
    #[cfg(test)]
    sleep_fn: Option<SleepFn>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            #[cfg(test)]
            sleep_fn: None,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn do_sleep(&self, ms: u64) {
        #[cfg(test)]
        if let Some(ref f) = self.sleep_fn {
            f(ms).await;
            return;
        }
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Run `op` until it succeeds or the policy is exhausted.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.policy.max_retries {
                        return Err(e);
                    }
                    let delay = self.policy.delay_for(attempt);
                    info!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after error"
                    );
                    self.do_sleep(delay.as_millis() as u64).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn instant_executor(max_retries: u32) -> RetryExecutor {
        RetryExecutor {
            policy: RetryPolicy {
                max_retries,
                base_delay_ms: 0,
                exponential_base: 2.0,
                max_delay_ms: 0,
            },
            sleep_fn: Some(Box::new(|_| Box::pin(async {}))),
        }
    }

    #[test]
    fn delay_computation() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay_ms: 500,
            exponential_base: 2.0,
            max_delay_ms: 30_000,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(6), Duration::from_millis(30_000)); // capped
    }

    #[test]
    fn delay_is_deterministic() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(2), policy.delay_for(2));
    }

    #[tokio::test]
    async fn succeeds_after_k_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let executor = instant_executor(3);
        let result: Result<u32, String> = executor
            .run(|| {
                let calls = calls_clone.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(format!("transient failure {n}"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        // Failed twice, succeeded on the third call: k + 1 invocations.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let executor = instant_executor(2);
        let result: Result<u32, String> = executor
            .run(|| {
                let calls = calls_clone.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {n}"))
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "failure 2");
        // max_retries + 1 invocations in total.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_retries_on_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let executor = instant_executor(5);
        let result: Result<&str, String> = executor
            .run(|| {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_retries_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let executor = instant_executor(0);
        let result: Result<(), String> = executor
            .run(|| {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("nope".to_string())
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
