//! Throttle: run now or not at all

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Runs an action only if at least `interval` has passed since the last
/// accepted one. Rejected actions are neither queued nor remembered.
#[derive(Debug)]
pub struct ThrottleScheduler {
    interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl ThrottleScheduler {
    pub fn new(interval: Duration) -> Self {
        debug!(?interval, "ThrottleScheduler::new: called");
        Self {
            interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `action` on a spawned task if the interval has elapsed
    ///
    /// Returns `false` (and drops `action` unrun) when called too soon.
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, action: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let now = Instant::now();
        {
            let mut last = self.last_dispatch.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(last) = *last {
                if now < last + self.interval {
                    debug!(since_last = ?now.duration_since(last), "ThrottleScheduler::schedule: too soon, dropping");
                    return false;
                }
            }
            *last = Some(now);
        }

        debug!("ThrottleScheduler::schedule: dispatching");
        tokio::spawn(async move { action() });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_action(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_within_interval_is_dropped() {
        let throttle = ThrottleScheduler::new(Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(throttle.schedule(counting_action(&counter)));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!throttle.schedule(counting_action(&counter)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_spaced_by_interval_both_run() {
        let throttle = ThrottleScheduler::new(Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(throttle.schedule(counting_action(&counter)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(throttle.schedule(counting_action(&counter)));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_does_not_extend_interval() {
        let throttle = ThrottleScheduler::new(Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(throttle.schedule(counting_action(&counter)));
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(!throttle.schedule(counting_action(&counter)));

        // Measured from the last accepted call, not the rejected one
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(throttle.schedule(counting_action(&counter)));
    }
}
