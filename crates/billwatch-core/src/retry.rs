//! Exponential backoff shared by the HTTP fetchers and the scoring client.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Multiplicative jitter range applied to each delay.
    pub jitter: (f64, f64),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(120),
            jitter: (0.8, 1.2),
        }
    }
}

impl RetryPolicy {
    /// Plain doubling from `base_delay` with no jitter and no practical cap.
    pub fn doubling(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(3600),
            jitter: (1.0, 1.0),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Un-jittered delay before retry number `attempt + 1`: `min(base · 2^attempt, max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let (lo, hi) = self.jitter;
        let factor = if hi > lo {
            rand::rng().random_range(lo..=hi)
        } else {
            lo
        };
        self.backoff(attempt).mul_f64(factor.max(0.0))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let wait = self.delay(attempt);
                    warn!(
                        label,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts(),
                        wait_secs = wait.as_secs_f64(),
                        error = %e,
                        "retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Failure {
        retryable: bool,
    }

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "failure (retryable={})", self.retryable)
        }
    }

    impl Retryable for Failure {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn instant(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::from_secs(5));
        assert_eq!(p.backoff(1), Duration::from_secs(10));
        assert_eq!(p.backoff(4), Duration::from_secs(80));
        assert_eq!(p.backoff(5), Duration::from_secs(120));
        assert_eq!(p.backoff(40), Duration::from_secs(120));
    }

    #[test]
    fn jitter_stays_in_range() {
        let p = RetryPolicy::default();
        for _ in 0..50 {
            let d = p.delay(1).as_secs_f64();
            assert!((8.0..=12.0).contains(&d), "{d}");
        }
    }

    #[test]
    fn doubling_has_no_jitter() {
        let p = RetryPolicy::doubling(2, Duration::from_secs(2));
        assert_eq!(p.delay(0), Duration::from_secs(2));
        assert_eq!(p.delay(1), Duration::from_secs(4));
        assert_eq!(p.max_attempts(), 3);
    }

    #[tokio::test]
    async fn persistent_retryable_failure_stops_at_cap() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Failure> = instant(5)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Failure { retryable: true }) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), Failure> = instant(5)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Failure { retryable: false }) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = instant(5)
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Failure { retryable: true })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
    }
}
