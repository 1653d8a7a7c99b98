//! Queueing strategies a [`crate::concurrent::ThreadPool`] can be built on.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use super::heap::PriorityHeap;

/// A task source a [`crate::concurrent::ThreadPool`] worker can block on.
///
/// `pop_blocking` returning `None` means the queue is closed and drained —
/// workers treat that as their signal to stop, not as an error.
pub trait QueueStrategy<T>: Send + Sync {
    /// Constructs an empty, open queue.
    fn new() -> Self
    where
        Self: Sized;

    /// Enqueues `item`. Strategies that don't order by priority ignore it.
    fn push(&self, item: T, priority: i32);

    /// Blocks until an item is available or the queue is closed and empty.
    fn pop_blocking(&self) -> Option<T>;

    /// Closes the queue: no further `push` is accepted, and every blocked
    /// (or future) `pop_blocking` call drains what remains, then returns
    /// `None`.
    fn close(&self);
}

struct SimpleState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// First-in-first-out task queue; `priority` is accepted and ignored.
pub struct SimpleQueue<T> {
    state: Mutex<SimpleState<T>>,
    ready: Condvar,
}

impl<T: Send> QueueStrategy<T> for SimpleQueue<T> {
    fn new() -> Self {
        Self { state: Mutex::new(SimpleState { items: VecDeque::new(), closed: false }), ready: Condvar::new() }
    }

    fn push(&self, item: T, _priority: i32) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.items.push_back(item);
        self.ready.notify_one();
    }

    fn pop_blocking(&self) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self.ready.wait(state).unwrap();
        }
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        self.ready.notify_all();
    }
}

/// Task queue ordered by ascending `priority` (smaller runs first), backed
/// by [`PriorityHeap`].
///
/// The heap itself has no notion of blocking; this strategy pairs it with a
/// `Condvar` signaled on every push. Because the heap's own locks are
/// separate from the condvar's mutex, a push's notification can in
/// principle race a waiter's check-then-wait — so `pop_blocking` backs its
/// wait with a short timeout and re-checks the heap, rather than risking an
/// indefinite sleep past a missed wakeup.
pub struct PriorityQueue<T> {
    heap: PriorityHeap<T>,
    signal: Mutex<()>,
    ready: Condvar,
    closed: AtomicBool,
}

impl<T: Send> QueueStrategy<T> for PriorityQueue<T> {
    fn new() -> Self {
        Self { heap: PriorityHeap::new(), signal: Mutex::new(()), ready: Condvar::new(), closed: AtomicBool::new(false) }
    }

    fn push(&self, item: T, priority: i32) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.heap.insert(item, priority);
        let _guard = self.signal.lock().unwrap();
        self.ready.notify_one();
    }

    fn pop_blocking(&self) -> Option<T> {
        loop {
            if let Some((item, _)) = self.heap.extract_min() {
                return Some(item);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            let guard = self.signal.lock().unwrap();
            if !self.heap.is_empty() || self.closed.load(Ordering::Acquire) {
                continue;
            }
            let _ = self.ready.wait_timeout(guard, Duration::from_millis(5)).unwrap();
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let _guard = self.signal.lock().unwrap();
        self.ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_queue_is_first_in_first_out() {
        let queue: SimpleQueue<i32> = QueueStrategy::new();
        queue.push(1, 0);
        queue.push(2, 0);
        queue.push(3, 0);
        assert_eq!(queue.pop_blocking(), Some(1));
        assert_eq!(queue.pop_blocking(), Some(2));
        assert_eq!(queue.pop_blocking(), Some(3));
    }

    #[test]
    fn closed_empty_simple_queue_returns_none() {
        let queue: SimpleQueue<i32> = QueueStrategy::new();
        queue.close();
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn priority_queue_orders_by_priority() {
        let queue: PriorityQueue<i32> = QueueStrategy::new();
        for (item, priority) in [(5, 5), (3, 3), (7, 7), (1, 1), (4, 4)] {
            queue.push(item, priority);
        }
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(queue.pop_blocking().unwrap());
        }
        assert_eq!(out, vec![1, 3, 4, 5, 7]);
    }

    #[test]
    fn closed_empty_priority_queue_returns_none() {
        let queue: PriorityQueue<i32> = QueueStrategy::new();
        queue.close();
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn priority_queue_drains_before_reporting_closed() {
        let queue: PriorityQueue<i32> = QueueStrategy::new();
        queue.push(1, 1);
        queue.close();
        assert_eq!(queue.pop_blocking(), Some(1));
        assert_eq!(queue.pop_blocking(), None);
    }
}
