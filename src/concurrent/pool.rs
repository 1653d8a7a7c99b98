//! A worker pool generic over its queueing strategy.

use std::any::Any;
use std::sync::Arc;
use std::thread::JoinHandle;

use super::future::Future;
use super::queue::QueueStrategy;
use super::stats::{PoolStats, PoolStatsSnapshot};

/// A boxed unit of work handed to a worker thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for [`ThreadPool::new`].
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Number of worker threads to spawn.
    pub num_workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2);
        Self { num_workers: available.max(2) }
    }
}

/// A fixed pool of worker threads pulling tasks from a [`QueueStrategy`].
///
/// `submit`/`submit_with_priority` return a [`Future`] the caller can
/// [`Future::wait`] on; a task that panics resolves its future with
/// [`super::error::PoolError::TaskFailed`] instead of taking the worker
/// thread down with it.
pub struct ThreadPool<Q: QueueStrategy<Task> + 'static> {
    queue: Arc<Q>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<PoolStats>,
}

impl<Q: QueueStrategy<Task> + 'static> ThreadPool<Q> {
    /// Spawns `config.num_workers` worker threads, each running a
    /// pop-execute loop until the queue is closed and drained.
    pub fn new(config: PoolConfig) -> Self {
        let queue: Arc<Q> = Arc::new(Q::new());
        let mut workers = Vec::with_capacity(config.num_workers);
        for _ in 0..config.num_workers {
            let queue = queue.clone();
            workers.push(std::thread::spawn(move || {
                while let Some(task) = queue.pop_blocking() {
                    task();
                }
            }));
        }
        Self { queue, workers, stats: Arc::new(PoolStats::new()) }
    }

    /// Task counters accumulated since the pool was created.
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    /// Submits `f` at the default priority (ignored by [`super::queue::SimpleQueue`],
    /// treated as priority `0` by [`super::queue::PriorityQueue`]).
    pub fn submit<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_with_priority(f, 0)
    }

    /// Submits `f` with an explicit `priority` (smaller runs first on a
    /// priority-ordered queue).
    pub fn submit_with_priority<F, R>(&self, f: F, priority: i32) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let future = Future::new();
        let future_for_task = future.clone();
        let stats = self.stats.clone();
        let task: Task = Box::new(move || {
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
                Ok(value) => {
                    let _ = future_for_task.set(value);
                    stats.record_completed();
                }
                Err(payload) => {
                    let _ = future_for_task.set_error(panic_message(payload));
                    stats.record_failed();
                }
            }
        });
        self.stats.record_submitted();
        self.queue.push(task, priority);
        future
    }

    /// Closes the queue: workers finish what's already enqueued, then exit
    /// instead of blocking for more work.
    pub fn close(&self) {
        self.queue.close();
    }
}

impl<Q: QueueStrategy<Task> + 'static> Drop for ThreadPool<Q> {
    fn drop(&mut self) {
        self.queue.close();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::queue::{PriorityQueue, SimpleQueue};
    use super::*;

    #[test]
    fn simple_pool_runs_submitted_tasks() {
        let pool: ThreadPool<SimpleQueue<Task>> = ThreadPool::new(PoolConfig { num_workers: 4 });
        let futures: Vec<_> = (0..100).map(|i| pool.submit(move || i * 2)).collect();
        for (i, future) in futures.into_iter().enumerate() {
            assert_eq!(future.wait().unwrap(), i * 2);
        }
    }

    #[test]
    fn priority_pool_runs_submitted_tasks() {
        let pool: ThreadPool<PriorityQueue<Task>> = ThreadPool::new(PoolConfig { num_workers: 4 });
        let futures: Vec<_> = (0..100).map(|i| pool.submit_with_priority(move || i * 2, i)).collect();
        for (i, future) in futures.into_iter().enumerate() {
            assert_eq!(future.wait().unwrap(), i * 2);
        }
    }

    #[test]
    fn a_panicking_task_resolves_its_future_as_failed() {
        let pool: ThreadPool<SimpleQueue<Task>> = ThreadPool::new(PoolConfig { num_workers: 2 });
        let future = pool.submit(|| -> i32 { panic!("boom") });
        let err = future.wait().unwrap_err();
        assert!(matches!(err, super::super::error::PoolError::TaskFailed(msg) if msg == "boom"));
    }

    #[test]
    fn closing_the_pool_lets_workers_drain_and_exit() {
        let pool: ThreadPool<SimpleQueue<Task>> = ThreadPool::new(PoolConfig { num_workers: 2 });
        let future = pool.submit(|| 1 + 1);
        pool.close();
        assert_eq!(future.wait().unwrap(), 2);
    }

    #[test]
    fn default_config_uses_at_least_two_workers() {
        let config = PoolConfig::default();
        assert!(config.num_workers >= 2);
    }
}
