//! Cooperative cancellation
//!
//! Every suspension point in the crate (retry backoff, inter-game delay,
//! scheduler waits) sleeps through a [`StopSignal`] so an external stop
//! request takes effect at the next checkpoint rather than preemptively.

use std::time::Duration;
use tokio::sync::watch;

/// Create a linked stop handle/signal pair
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Sending side of the stop channel, held by the process entry point
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Request a stop; observers react at their next checkpoint
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }

    /// Derive another signal observing this handle
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side of the stop channel; cheap to clone
#[derive(Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// A signal that never fires, for one-shot contexts without a handle
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Check the flag without suspending
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop has been requested
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without ever stopping; nothing to wait for.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration`, waking early on stop
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_stopped() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancelled() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initially_not_stopped() {
        let (_handle, signal) = stop_channel();
        assert!(!signal.is_stopped());
    }

    #[tokio::test]
    async fn test_stop_observed() {
        let (handle, signal) = stop_channel();
        handle.stop();
        assert!(signal.is_stopped());
        assert!(handle.signal().is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_to_completion() {
        let (_handle, signal) = stop_channel();
        assert!(signal.sleep(Duration::from_secs(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_stop() {
        let (handle, signal) = stop_channel();

        let sleeper = tokio::spawn(async move { signal.sleep(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        handle.stop();

        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test]
    async fn test_sleep_already_stopped_returns_immediately() {
        let (handle, signal) = stop_channel();
        handle.stop();
        assert!(!signal.sleep(Duration::from_secs(3600)).await);
    }

    #[tokio::test]
    async fn test_never_signal() {
        let signal = StopSignal::never();
        assert!(!signal.is_stopped());
        assert!(signal.sleep(Duration::ZERO).await);
    }
}
