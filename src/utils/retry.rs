//! Retry policy for check-in attempts
//!
//! Wraps a single logical operation (one check-in attempt for one account)
//! with bounded retries and linear backoff. Only transient classifications
//! (`network_error`, `rate_limited`) are retried; terminal outcomes return
//! immediately. On exhaustion the last result is returned with its original
//! classification rather than a synthesized error.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::AttemptResult;
use crate::utils::stop::StopSignal;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum total attempts (first try included)
    pub max_retries: u32,

    /// Base delay for linear backoff; attempt `n` waits `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with custom limits
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff delay after the given attempt number (starting at 1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Execute an operation with retry on transient failures
    ///
    /// The operation produces one [`AttemptResult`] per invocation. The
    /// returned result carries the total attempt count and wall time
    /// including backoff waits. Backoff sleeps observe the stop signal; an
    /// interrupted wait returns the last result as-is.
    pub async fn execute<F, Fut>(&self, stop: &StopSignal, operation: F) -> AttemptResult
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AttemptResult>,
    {
        let started = Instant::now();
        let max_attempts = self.max_retries.max(1);
        let mut attempt = 1u32;

        loop {
            let result = operation().await;

            if !result.status.is_transient() {
                if attempt > 1 {
                    debug!(
                        game = %result.game,
                        attempt,
                        status = %result.status,
                        "attempt settled after retries"
                    );
                }
                return result
                    .with_attempts(attempt)
                    .with_elapsed(started.elapsed());
            }

            if attempt >= max_attempts {
                warn!(
                    game = %result.game,
                    attempts = attempt,
                    status = %result.status,
                    "retries exhausted"
                );
                return result
                    .with_attempts(attempt)
                    .with_elapsed(started.elapsed());
            }

            let delay = self.delay_for(attempt);
            debug!(
                game = %result.game,
                attempt,
                delay_ms = delay.as_millis() as u64,
                status = %result.status,
                "transient failure, retrying after backoff"
            );

            if !stop.sleep(delay).await {
                warn!(game = %result.game, "backoff interrupted by stop signal");
                return result
                    .with_attempts(attempt)
                    .with_elapsed(started.elapsed());
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameId;
    use crate::models::CheckinStatus;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn outcome(status: CheckinStatus) -> AttemptResult {
        AttemptResult::new(GameId::Hsr, status, "test")
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let policy = RetryPolicy::default();
        let stop = StopSignal::never();

        let result = policy
            .execute(&stop, || async { outcome(CheckinStatus::Success) })
            .await;

        assert_eq!(result.status, CheckinStatus::Success);
        assert_eq!(result.attempt_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let stop = StopSignal::never();
        let calls = Arc::new(AtomicU32::new(0));

        let calls_clone = Arc::clone(&calls);
        let result = policy
            .execute(&stop, move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        outcome(CheckinStatus::RateLimited)
                    } else {
                        outcome(CheckinStatus::Success)
                    }
                }
            })
            .await;

        assert_eq!(result.status, CheckinStatus::Success);
        assert_eq!(result.attempt_count, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two backoff waits: 1s + 2s
        assert!(result.elapsed >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_terminal_failure_not_retried() {
        let policy = RetryPolicy::new(10, Duration::from_millis(1));
        let stop = StopSignal::never();
        let calls = Arc::new(AtomicU32::new(0));

        let calls_clone = Arc::clone(&calls);
        let result = policy
            .execute(&stop, move || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    outcome(CheckinStatus::AuthInvalid)
                }
            })
            .await;

        assert_eq!(result.status, CheckinStatus::AuthInvalid);
        assert_eq!(result.attempt_count, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_keeps_last_classification() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let stop = StopSignal::never();

        let result = policy
            .execute(&stop, || async { outcome(CheckinStatus::NetworkError) })
            .await;

        assert_eq!(result.status, CheckinStatus::NetworkError);
        assert_eq!(result.attempt_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_secs(3600));
        let (handle, stop) = crate::utils::stop::stop_channel();

        let task = tokio::spawn(async move {
            policy
                .execute(&stop, || async { outcome(CheckinStatus::NetworkError) })
                .await
        });
        tokio::task::yield_now().await;
        handle.stop();

        let result = task.await.unwrap();
        assert_eq!(result.status, CheckinStatus::NetworkError);
        assert_eq!(result.attempt_count, 1);
    }
}
