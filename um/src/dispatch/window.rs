//! Dispatch window implementation

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::config::DispatchConfig;

/// A runnable network call plus what it targets, for logging
pub struct NetworkTask {
    pub method: String,
    pub target: String,
    run: BoxFuture<'static, ()>,
}

impl NetworkTask {
    pub fn new<F>(method: impl Into<String>, target: impl Into<String>, run: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            method: method.into(),
            target: target.into(),
            run: run.boxed(),
        }
    }
}

impl std::fmt::Debug for NetworkTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkTask")
            .field("method", &self.method)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Counters for the window
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WindowStats {
    pub total_submitted: u64,
    pub total_released: u64,
    pub total_deferred: u64,
    pub peak_pending: usize,
}

/// Internal state protected by mutex
struct WindowInner {
    /// Tasks waiting for a slot, oldest first
    queue: VecDeque<NetworkTask>,

    /// When the first task of the current window was released
    window_start: Option<Instant>,

    /// Tasks released since `window_start`
    count: usize,

    stats: WindowStats,

    /// Set once the owning window is dropped; the worker exits when the queue empties
    closed: bool,
}

impl WindowInner {
    /// Reset the window if it has elapsed, then release as many queued tasks
    /// as the window still allows
    fn release_ready(&mut self, limit: usize, window: Duration, now: Instant) -> Vec<NetworkTask> {
        if let Some(start) = self.window_start {
            if now.duration_since(start) >= window {
                self.window_start = None;
                self.count = 0;
            }
        }

        let mut released = Vec::new();
        while self.count < limit {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            if self.count == 0 {
                self.window_start = Some(now);
            }
            self.count += 1;
            released.push(task);
        }

        self.stats.total_released += released.len() as u64;
        released
    }

    /// When the worker should next look at the queue, if anything is waiting
    fn next_deadline(&self, window: Duration) -> Option<Instant> {
        if self.queue.is_empty() {
            return None;
        }
        self.window_start.map(|start| start + window)
    }
}

fn lock(inner: &Mutex<WindowInner>) -> MutexGuard<'_, WindowInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn run_released(released: Vec<NetworkTask>) {
    for task in released {
        debug!(method = %task.method, target = %task.target, "DispatchWindow: releasing request");
        tokio::spawn(task.run);
    }
}

/// Gate releasing at most `limit` tasks per rolling window
///
/// Must be created from within a Tokio runtime. Release happens either
/// synchronously on `submit` (when the window has room) or from the window
/// worker once the current window elapses; both paths update the counters
/// under the same lock. Dropping the window keeps the worker alive until every
/// deferred task has been released.
pub struct DispatchWindow {
    limit: usize,
    window: Duration,
    inner: Arc<Mutex<WindowInner>>,
    wake: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl DispatchWindow {
    pub fn new(limit_per_window: usize, window: Duration) -> Self {
        debug!(limit_per_window, ?window, "DispatchWindow::new: called");
        let limit = limit_per_window.max(1);
        let inner = Arc::new(Mutex::new(WindowInner {
            queue: VecDeque::new(),
            window_start: None,
            count: 0,
            stats: WindowStats::default(),
            closed: false,
        }));
        let wake = Arc::new(Notify::new());

        let worker = tokio::spawn(window_loop(inner.clone(), wake.clone(), limit, window));

        Self {
            limit,
            window,
            inner,
            wake,
            worker,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.limit_per_window, config.window())
    }

    /// Accept a task; it runs now if the window has room, otherwise once a
    /// later window opens. Never rejects.
    pub fn submit(&self, task: NetworkTask) {
        debug!(method = %task.method, target = %task.target, "DispatchWindow::submit: called");
        let (released, deferred) = {
            let mut inner = lock(&self.inner);
            inner.queue.push_back(task);
            inner.stats.total_submitted += 1;

            let released = inner.release_ready(self.limit, self.window, Instant::now());
            let deferred = !inner.queue.is_empty();
            if deferred {
                inner.stats.total_deferred += 1;
                inner.stats.peak_pending = inner.stats.peak_pending.max(inner.queue.len());
            }
            (released, deferred)
        };

        if deferred {
            debug!("DispatchWindow::submit: window full, deferring");
            self.wake.notify_one();
        }
        run_released(released);
    }

    /// Tasks waiting for a later window
    pub fn pending(&self) -> usize {
        lock(&self.inner).queue.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn stats(&self) -> WindowStats {
        lock(&self.inner).stats.clone()
    }

    /// Stop the window worker; deferred tasks are discarded
    pub fn shutdown(&self) {
        debug!("DispatchWindow::shutdown: called");
        self.worker.abort();
        lock(&self.inner).queue.clear();
    }
}

impl Drop for DispatchWindow {
    fn drop(&mut self) {
        let pending = {
            let mut inner = lock(&self.inner);
            inner.closed = true;
            inner.queue.len()
        };
        debug!(pending, "DispatchWindow::drop: flushing deferred tasks");
        self.wake.notify_one();
    }
}

impl std::fmt::Debug for DispatchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchWindow")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("pending", &self.pending())
            .finish()
    }
}

async fn window_loop(inner: Arc<Mutex<WindowInner>>, wake: Arc<Notify>, limit: usize, window: Duration) {
    loop {
        let deadline = {
            let inner = lock(&inner);
            if inner.closed && inner.queue.is_empty() {
                debug!("window_loop: window dropped and queue empty, exiting");
                return;
            }
            inner.next_deadline(window)
        };

        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => {
                wake.notified().await;
                continue;
            }
        }

        let released = lock(&inner).release_ready(limit, window, Instant::now());
        if !released.is_empty() {
            debug!(released = released.len(), "window_loop: window elapsed, flushing");
        }
        run_released(released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>, target: &str) -> NetworkTask {
        let counter = counter.clone();
        NetworkTask::new("GET", target, async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_releases_limit_then_waits_for_window() {
        let window = DispatchWindow::new(5, Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));

        for i in 0..7 {
            window.submit(counting_task(&counter, &format!("/users/{}", i)));
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(window.pending(), 2);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 7);
        assert_eq!(window.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_order_is_fifo_across_windows() {
        let window = DispatchWindow::new(1, Duration::from_secs(1));
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let order = order.clone();
            window.submit(NetworkTask::new("GET", "/users", async move {
                order.lock().unwrap().push(i);
            }));
        }

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_window_resets_on_submit() {
        let window = DispatchWindow::new(2, Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));

        window.submit(counting_task(&counter, "/a"));
        window.submit(counting_task(&counter, "/b"));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        window.submit(counting_task(&counter, "/c"));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(window.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_submit_does_not_overtake_deferred_task() {
        let window = DispatchWindow::new(1, Duration::from_secs(1));
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let order = order.clone();
            window.submit(NetworkTask::new("GET", name, async move {
                order.lock().unwrap().push(name);
            }));
        }

        tokio::time::sleep(Duration::from_millis(1200)).await;
        let order_third = order.clone();
        window.submit(NetworkTask::new("GET", "third", async move {
            order_third.lock().unwrap().push("third");
        }));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_tracking() {
        let window = DispatchWindow::new(1, Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));

        window.submit(counting_task(&counter, "/a"));
        window.submit(counting_task(&counter, "/b"));
        window.submit(counting_task(&counter, "/c"));

        let stats = window.stats();
        assert_eq!(stats.total_submitted, 3);
        assert_eq!(stats.total_released, 1);
        assert_eq!(stats.peak_pending, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_respect_limit() {
        let window = Arc::new(DispatchWindow::new(5, Duration::from_secs(30)));
        let counter = Arc::new(AtomicUsize::new(0));

        let submitters: Vec<_> = (0..20)
            .map(|i| {
                let window = window.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    window.submit(counting_task(&counter, &format!("/users/{}", i)));
                })
            })
            .collect();
        for submitter in submitters {
            submitter.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(window.pending(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_window_still_flushes_deferred_tasks() {
        let window = DispatchWindow::new(1, Duration::from_secs(1));
        let counter = Arc::new(AtomicUsize::new(0));
        for target in ["/a", "/b", "/c"] {
            window.submit(counting_task(&counter, target));
        }
        let worker_state = window.inner.clone();
        drop(window);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(Arc::strong_count(&worker_state), 1);
    }
}
