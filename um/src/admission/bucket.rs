//! Leaky bucket implementation

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::config::AdmissionConfig;

/// A deferred unit of work held in the backlog
pub type Job = BoxFuture<'static, ()>;

/// Counters for the bucket
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BucketStats {
    pub total_admitted: u64,
    pub total_rejected: u64,
    pub total_released: u64,
    pub peak_backlog: usize,
}

/// Internal state protected by mutex
struct BucketInner {
    /// Pending jobs, oldest first
    backlog: VecDeque<Job>,

    /// Statistics
    stats: BucketStats,

    /// Set once the owning bucket is dropped; the ticker exits when the backlog empties
    closed: bool,
}

fn lock(inner: &Mutex<BucketInner>) -> MutexGuard<'_, BucketInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded FIFO backlog drained at a fixed rate by a background ticker
///
/// Must be created from within a Tokio runtime. Dropping the bucket does not
/// cancel admitted work: the ticker keeps draining at the same rate until the
/// backlog is empty and then exits. Only [`LeakyBucket::shutdown`] discards jobs.
pub struct LeakyBucket {
    capacity: usize,
    drain_rate: usize,
    tick_period: Duration,
    inner: Arc<Mutex<BucketInner>>,
    ticker: JoinHandle<()>,
}

impl LeakyBucket {
    /// Create a bucket and start its drain ticker
    ///
    /// The first drain happens one full `tick_period` after construction. A
    /// zero drain rate or tick period is raised to the smallest usable value.
    pub fn new(capacity: usize, drain_rate: usize, tick_period: Duration) -> Self {
        debug!(capacity, drain_rate, ?tick_period, "LeakyBucket::new: called");
        let drain_rate = drain_rate.max(1);
        let tick_period = tick_period.max(Duration::from_millis(1));
        let inner = Arc::new(Mutex::new(BucketInner {
            backlog: VecDeque::with_capacity(capacity),
            stats: BucketStats::default(),
            closed: false,
        }));

        let ticker = tokio::spawn(drain_loop(inner.clone(), drain_rate, tick_period));

        Self {
            capacity,
            drain_rate,
            tick_period,
            inner,
            ticker,
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(config.capacity, config.drain_rate, config.tick_period())
    }

    /// Offer a job to the backlog
    ///
    /// Returns `false` without side effects when the backlog already holds
    /// `capacity` unreleased jobs.
    pub fn try_enqueue<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = lock(&self.inner);

        if inner.backlog.len() >= self.capacity {
            inner.stats.total_rejected += 1;
            debug!(backlog = inner.backlog.len(), "LeakyBucket::try_enqueue: full, rejecting");
            return false;
        }

        inner.backlog.push_back(job.boxed());
        inner.stats.total_admitted += 1;
        inner.stats.peak_backlog = inner.stats.peak_backlog.max(inner.backlog.len());
        debug!(backlog = inner.backlog.len(), "LeakyBucket::try_enqueue: admitted");
        true
    }

    /// Number of jobs waiting in the backlog
    pub fn len(&self) -> usize {
        lock(&self.inner).backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn drain_rate(&self) -> usize {
        self.drain_rate
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub fn stats(&self) -> BucketStats {
        lock(&self.inner).stats.clone()
    }

    /// Stop the drain ticker; pending jobs are discarded
    pub fn shutdown(&self) {
        debug!("LeakyBucket::shutdown: called");
        self.ticker.abort();
        lock(&self.inner).backlog.clear();
    }
}

impl Drop for LeakyBucket {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        inner.closed = true;
        debug!(backlog = inner.backlog.len(), "LeakyBucket::drop: draining remaining backlog");
    }
}

impl std::fmt::Debug for LeakyBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeakyBucket")
            .field("capacity", &self.capacity)
            .field("drain_rate", &self.drain_rate)
            .field("tick_period", &self.tick_period)
            .field("backlog", &self.len())
            .finish()
    }
}

/// Pop up to `drain_rate` jobs from the head of the backlog
///
/// The flag is true once the bucket is closed and nothing is left to release.
fn leak(inner: &Mutex<BucketInner>, drain_rate: usize) -> (Vec<Job>, bool) {
    let mut inner = lock(inner);
    let count = drain_rate.min(inner.backlog.len());
    let released: Vec<Job> = inner.backlog.drain(..count).collect();
    inner.stats.total_released += released.len() as u64;
    (released, inner.closed && inner.backlog.is_empty())
}

async fn drain_loop(inner: Arc<Mutex<BucketInner>>, drain_rate: usize, tick_period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + tick_period, tick_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let (released, finished) = leak(&inner, drain_rate);
        if !released.is_empty() {
            debug!(released = released.len(), "drain_loop: releasing jobs");
        }
        // Released jobs run on their own tasks so a slow job never delays the next tick
        for job in released {
            tokio::spawn(job);
        }

        if finished {
            debug!("drain_loop: bucket dropped and backlog empty, exiting");
            break;
        }
    }
}
