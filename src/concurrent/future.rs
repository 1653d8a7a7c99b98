//! A single-assignment, thread-safe result cell.

use std::sync::{Arc, Condvar, Mutex};

use super::error::{PoolError, PoolResult};

enum State<R> {
    Pending,
    Ready(R),
    Failed(String),
}

struct Shared<R> {
    state: Mutex<State<R>>,
    ready: Condvar,
}

/// A handle to a result that some other thread will eventually produce.
///
/// Cloning a `Future` gives another handle to the same underlying result —
/// every clone observes the same value once it is set. Mirrors the
/// `shared_ptr<DataContainer<T>>` wrapper this is modeled on.
pub struct Future<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Future<R> {
    pub(crate) fn new() -> Self {
        Self { shared: Arc::new(Shared { state: Mutex::new(State::Pending), ready: Condvar::new() }) }
    }

    /// Resolves the future with `value`. Returns [`PoolError::AlreadySet`]
    /// if it was already resolved.
    pub fn set(&self, value: R) -> PoolResult<()> {
        let mut state = self.shared.state.lock().unwrap();
        if !matches!(*state, State::Pending) {
            return Err(PoolError::AlreadySet);
        }
        *state = State::Ready(value);
        self.shared.ready.notify_all();
        Ok(())
    }

    /// Resolves the future with a failure, to be re-surfaced to every
    /// waiter as [`PoolError::TaskFailed`]. Returns
    /// [`PoolError::AlreadySet`] if it was already resolved.
    pub fn set_error(&self, message: impl Into<String>) -> PoolResult<()> {
        let mut state = self.shared.state.lock().unwrap();
        if !matches!(*state, State::Pending) {
            return Err(PoolError::AlreadySet);
        }
        *state = State::Failed(message.into());
        self.shared.ready.notify_all();
        Ok(())
    }

    /// Blocks until the future is resolved, returning a clone of the value
    /// or the task's failure.
    pub fn wait(&self) -> PoolResult<R>
    where
        R: Clone,
    {
        let mut state = self.shared.state.lock().unwrap();
        loop {
            match &*state {
                State::Pending => state = self.shared.ready.wait(state).unwrap(),
                State::Ready(value) => return Ok(value.clone()),
                State::Failed(message) => return Err(PoolError::TaskFailed(message.clone())),
            }
        }
    }

    /// Whether the future has already been resolved, one way or the other.
    pub fn is_ready(&self) -> bool {
        !matches!(*self.shared.state.lock().unwrap(), State::Pending)
    }

    /// Returns the failure message without blocking, if the future has
    /// already resolved to an error — `None` if it is still pending or
    /// resolved successfully. Unlike `wait`, this never blocks and never
    /// requires `R: Clone`.
    pub fn take_error(&self) -> Option<String> {
        match &*self.shared.state.lock().unwrap() {
            State::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }
}

impl<R> Clone for Future<R> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl Future<()> {
    /// Convenience for `set(())`, for tasks that produce no value.
    pub fn set_void(&self) -> PoolResult<()> {
        self.set(())
    }
}
