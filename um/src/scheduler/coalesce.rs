//! Delay-and-coalesce: always run, never closer than `interval` apart

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Runs every action, delaying each until at least `interval` after the
/// previously scheduled run
///
/// The run time is claimed before the delayed action fires, so back-to-back
/// calls serialize at `interval` spacing in call order.
#[derive(Debug)]
pub struct CoalesceScheduler {
    interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl CoalesceScheduler {
    pub fn new(interval: Duration) -> Self {
        debug!(?interval, "CoalesceScheduler::new: called");
        Self {
            interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arrange for `action` to run at `max(last + interval, now)`
    ///
    /// Returns the instant the action is scheduled for. Must be called from
    /// within a Tokio runtime.
    pub fn schedule<F>(&self, action: F) -> Instant
    where
        F: FnOnce() + Send + 'static,
    {
        let now = Instant::now();
        let run_at = {
            let mut last = self.last_dispatch.lock().unwrap_or_else(PoisonError::into_inner);
            let run_at = match *last {
                Some(last) => (last + self.interval).max(now),
                None => now,
            };
            *last = Some(run_at);
            run_at
        };

        debug!(delay = ?run_at.duration_since(now), "CoalesceScheduler::schedule: scheduled");
        tokio::spawn(async move {
            tokio::time::sleep_until(run_at).await;
            action();
        });
        run_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_simultaneous_calls_run_spaced_in_order() {
        let interval = Duration::from_millis(500);
        let scheduler = CoalesceScheduler::new(interval);
        let runs = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let runs = runs.clone();
            scheduler.schedule(move || {
                runs.lock().unwrap().push((i, Instant::now()));
            });
        }

        tokio::time::sleep(Duration::from_secs(3)).await;
        let runs = runs.lock().unwrap();

        assert_eq!(runs.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        for pair in runs.windows(2) {
            assert!(pair[1].1.duration_since(pair[0].1) >= interval);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_runs_immediately() {
        let scheduler = CoalesceScheduler::new(Duration::from_secs(1));
        let start = Instant::now();

        let run_at = scheduler.schedule(|| {});
        assert_eq!(run_at, start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_gap_longer_than_interval_runs_now() {
        let scheduler = CoalesceScheduler::new(Duration::from_secs(1));
        scheduler.schedule(|| {});

        tokio::time::sleep(Duration::from_secs(5)).await;
        let now = Instant::now();
        assert_eq!(scheduler.schedule(|| {}), now);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_strictly_increase() {
        let scheduler = CoalesceScheduler::new(Duration::from_millis(200));
        let first = scheduler.schedule(|| {});
        let second = scheduler.schedule(|| {});
        let third = scheduler.schedule(|| {});

        assert_eq!(second - first, Duration::from_millis(200));
        assert_eq!(third - second, Duration::from_millis(200));
    }
}
