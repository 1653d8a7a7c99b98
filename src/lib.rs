//! # slab-pool
//!
//! A thread-local slab allocator in the Hoard style, and a fine-grained
//! concurrent priority heap feeding a worker pool.
//!
//! The two halves of this crate share an idiom — a data structure guarded by
//! a coarse "shape" lock plus fine-grained per-element locks — but are
//! otherwise independent:
//!
//! - [`alloc`] — [`alloc::LocalPool`] / [`alloc::MainPool`], a per-thread
//!   size-classed heap with cross-thread free handling, and
//!   [`alloc::GlobalSlabAllocator`] to install it as the process allocator.
//! - [`concurrent`] — [`concurrent::PriorityHeap`], [`concurrent::ThreadPool`]
//!   and [`concurrent::Future`], a lock-coupled concurrent heap and the
//!   worker pool built on it.

pub mod alloc;
pub mod concurrent;

pub use alloc::{
    AllocError, AllocResult, AllocatorStats, AllocatorStatsSnapshot, GlobalSlabAllocator, LocalPool, MainPool,
};
pub use concurrent::{
    Future, PoolConfig, PoolError, PoolResult, PoolStats, PoolStatsSnapshot, PriorityHeap, PriorityQueue,
    QueueStrategy, SimpleQueue, Task, ThreadPool,
};
