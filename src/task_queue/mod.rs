//! Bounded-concurrency FIFO task queue (spec §4.1, §9's "worker pool with a
//! bounded channel and a completion signal").
//!
//! Tasks start in insertion order; concurrency never exceeds the configured
//! limit; a failing task never blocks the ones queued after it.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify, Semaphore};

type BoxedTask<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Point-in-time counters for a queue (spec §4.1).
#[derive(Debug, Default, Clone)]
pub struct QueueStats {
    pub pending: u64,
    pub in_flight: u64,
    pub completed: u64,
    pub failed: u64,
    pub last_error: Option<String>,
    pub last_duration_ms: Option<u64>,
}

/// Tuning for an `AsyncTaskQueue`.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_concurrency: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

struct Counters {
    pending: AtomicU64,
    in_flight: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    last_error: Mutex<Option<String>>,
    last_duration_ms: AtomicU64,
    has_duration: std::sync::atomic::AtomicBool,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            pending: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_error: Mutex::new(None),
            last_duration_ms: AtomicU64::new(0),
            has_duration: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

/// A bounded-concurrency FIFO queue of boxed futures producing `Result<T, String>`.
///
/// Work is submitted via `enqueue`, runs on `tokio::spawn`ed workers gated by
/// a semaphore, and `on_idle` resolves once `pending == 0 && in_flight == 0`.
pub struct AsyncTaskQueue<T: Send + 'static> {
    sender: mpsc::UnboundedSender<BoxedTask<std::result::Result<T, String>>>,
    max_concurrency: usize,
    counters: Arc<Counters>,
    idle_notify: Arc<Notify>,
    active_tasks: Arc<AtomicU64>,
}

impl<T: Send + 'static> AsyncTaskQueue<T> {
    /// Spawn a queue with `config.max_concurrency` worker slots.
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        let (sender, mut receiver) =
            mpsc::unbounded_channel::<BoxedTask<std::result::Result<T, String>>>();
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        let counters = Arc::new(Counters::default());
        let idle_notify = Arc::new(Notify::new());
        let active_tasks = Arc::new(AtomicU64::new(0));

        let dispatch_semaphore = semaphore.clone();
        let dispatch_counters = counters.clone();
        let dispatch_idle = idle_notify.clone();
        let dispatch_active = active_tasks.clone();

        tokio::spawn(async move {
            while let Some(task) = receiver.recv().await {
                let permit = dispatch_semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed while sender is alive");
                dispatch_counters.pending.fetch_sub(1, Ordering::SeqCst);
                dispatch_counters.in_flight.fetch_add(1, Ordering::SeqCst);
                dispatch_active.fetch_add(1, Ordering::SeqCst);

                let counters = dispatch_counters.clone();
                let idle = dispatch_idle.clone();
                let active = dispatch_active.clone();

                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = task.await;
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    counters.last_duration_ms.store(elapsed_ms, Ordering::SeqCst);
                    counters.has_duration.store(true, Ordering::SeqCst);

                    match outcome {
                        Ok(_) => {
                            counters.completed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(message) => {
                            counters.failed.fetch_add(1, Ordering::SeqCst);
                            *counters.last_error.lock() = Some(message);
                        }
                    }

                    counters.in_flight.fetch_sub(1, Ordering::SeqCst);
                    drop(permit);
                    if active.fetch_sub(1, Ordering::SeqCst) == 1 {
                        idle.notify_waiters();
                    }
                });
            }
        });

        Self {
            sender,
            max_concurrency: config.max_concurrency.max(1),
            counters,
            idle_notify,
            active_tasks,
        }
    }

    /// Submit a task. Returns immediately; the task runs once a concurrency
    /// slot is free, in FIFO order relative to other enqueued tasks.
    pub fn enqueue<F>(&self, future: F)
    where
        F: Future<Output = std::result::Result<T, String>> + Send + 'static,
    {
        self.counters.pending.fetch_add(1, Ordering::SeqCst);
        let _ = self.sender.send(Box::pin(future));
    }

    /// Resolve once `pending == 0 && in_flight == 0`.
    pub async fn on_idle(&self) {
        loop {
            if self.active_tasks.load(Ordering::SeqCst) == 0
                && self.counters.pending.load(Ordering::SeqCst) == 0
            {
                return;
            }
            self.idle_notify.notified().await;
        }
    }

    /// Number of tasks queued but not yet started.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.counters.pending.load(Ordering::SeqCst)
    }

    /// Configured concurrency ceiling.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Snapshot of the queue's counters.
    #[must_use]
    pub fn metrics(&self) -> QueueStats {
        QueueStats {
            pending: self.counters.pending.load(Ordering::SeqCst),
            in_flight: self.counters.in_flight.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            last_error: self.counters.last_error.lock().clone(),
            last_duration_ms: self
                .counters
                .has_duration
                .load(Ordering::SeqCst)
                .then(|| self.counters.last_duration_ms.load(Ordering::SeqCst)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn tasks_run_and_idle_resolves_after_completion() {
        let queue: AsyncTaskQueue<u32> = AsyncTaskQueue::new(QueueConfig { max_concurrency: 2 });
        for i in 0..5u32 {
            queue.enqueue(async move { Ok(i) });
        }
        queue.on_idle().await;
        let stats = queue.metrics();
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test]
    async fn a_failing_task_does_not_block_others() {
        let queue: AsyncTaskQueue<u32> = AsyncTaskQueue::new(QueueConfig { max_concurrency: 4 });
        queue.enqueue(async { Err("boom".to_string()) });
        queue.enqueue(async { Ok(1) });
        queue.on_idle().await;
        let stats = queue.metrics();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.last_error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_configured_limit() {
        let queue: AsyncTaskQueue<u32> = AsyncTaskQueue::new(QueueConfig { max_concurrency: 2 });
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        for _ in 0..6u32 {
            let concurrent = concurrent.clone();
            let max_seen = max_seen.clone();
            queue.enqueue(async move {
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
                Ok(0)
            });
        }
        queue.on_idle().await;
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }
}
