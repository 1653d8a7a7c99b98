//! Error types for the concurrent heap, queues, and thread pool.

/// Errors surfaced by [`crate::concurrent::Future`] and
/// [`crate::concurrent::ThreadPool`].
///
/// A closed queue is deliberately not represented here: `pop`/`pop_blocking`
/// on a closed, empty queue return `None`, since shutdown is an expected
/// condition, not a failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    /// A [`crate::concurrent::Future`] was already resolved (either with a
    /// value or an error) when a second `set`/`set_error` call arrived.
    #[error("future was already set")]
    AlreadySet,

    /// The task feeding a [`crate::concurrent::Future`] panicked or
    /// otherwise failed before it could produce a result.
    #[error("task failed: {0}")]
    TaskFailed(String),
}

/// Result alias for concurrent-pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
