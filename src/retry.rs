//! Retry with exponential backoff.
//!
//! One policy shared by article fetching and speech synthesis: a bounded
//! number of attempts, starting from an initial delay that doubles after
//! every failure.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry parameters for a single call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Build a policy from a delay expressed in (fractional) seconds.
    pub fn from_secs_f64(max_attempts: u32, initial_delay_secs: f64) -> Self {
        let initial_delay = Duration::try_from_secs_f64(initial_delay_secs.max(0.0))
            .unwrap_or(Self::default().initial_delay);
        Self::new(max_attempts, initial_delay)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// The last error is returned when every attempt fails.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.attempts();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        op = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_unrepresentable_delay_falls_back_to_default() {
        let default = RetryPolicy::default().initial_delay;
        assert_eq!(RetryPolicy::from_secs_f64(2, f64::INFINITY).initial_delay, default);
        assert_eq!(RetryPolicy::from_secs_f64(2, 1e30).initial_delay, default);
        assert_eq!(RetryPolicy::from_secs_f64(2, -1.0).initial_delay, Duration::ZERO);
        assert_eq!(RetryPolicy::from_secs_f64(2, 0.5).initial_delay, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Cell::new(0);

        let result: Result<&str, String> = policy
            .run("test", |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err(format!("fail {}", attempt))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error_when_exhausted() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let calls = Cell::new(0);

        let result: Result<(), String> = policy
            .run("test", |attempt| {
                calls.set(calls.get() + 1);
                async move { Err(format!("fail {}", attempt)) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "fail 2");
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let calls = Cell::new(0);
        let _: Result<(), String> = policy
            .run("test", |_| {
                calls.set(calls.get() + 1);
                async { Err("nope".to_string()) }
            })
            .await;
        assert_eq!(calls.get(), 1);
    }
}
