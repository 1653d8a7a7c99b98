//! A fine-grained concurrent priority heap and the worker pool built on it.
//!
//! [`PriorityHeap`] is the lock-coupled data structure; [`SimpleQueue`] and
//! [`PriorityQueue`] adapt it (and a plain FIFO deque) into the blocking
//! [`QueueStrategy`] a [`ThreadPool`] pulls work from. Every submitted task
//! gets back a [`Future`] to wait on.

mod error;
mod future;
mod heap;
mod pool;
mod queue;
mod stats;

pub use error::{PoolError, PoolResult};
pub use future::Future;
pub use heap::PriorityHeap;
pub use pool::{PoolConfig, Task, ThreadPool};
pub use queue::{PriorityQueue, QueueStrategy, SimpleQueue};
pub use stats::{PoolStats, PoolStatsSnapshot};
