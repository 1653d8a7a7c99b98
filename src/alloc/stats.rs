//! Atomic allocator counters.
//!
//! Mirrors `nebula-memory`'s `AtomicAllocatorStats`: a set of relaxed
//! counters cheap enough to update on every allocation, exposed as a
//! point-in-time snapshot rather than a push-based metrics pipeline.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Allocation counters for one [`crate::alloc::MainPool`].
#[derive(Debug, Default)]
pub struct AllocatorStats {
    bytes_allocated: AtomicU64,
    bytes_freed: AtomicU64,
    super_blocks_created: AtomicUsize,
    super_blocks_live: AtomicUsize,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    large_allocations: AtomicU64,
}

impl AllocatorStats {
    /// Creates a zeroed counter set.
    pub const fn new() -> Self {
        Self {
            bytes_allocated: AtomicU64::new(0),
            bytes_freed: AtomicU64::new(0),
            super_blocks_created: AtomicUsize::new(0),
            super_blocks_live: AtomicUsize::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            large_allocations: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_alloc(&self, bytes: usize) {
        self.bytes_allocated.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_free(&self, bytes: usize) {
        self.bytes_freed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_super_block_created(&self) {
        self.super_blocks_created.fetch_add(1, Ordering::Relaxed);
        self.super_blocks_live.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_large_allocation(&self) {
        self.large_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a consistent-enough snapshot of all counters.
    ///
    /// Individual fields are read independently, so under concurrent
    /// activity the snapshot is not atomic as a whole — adequate for
    /// diagnostics, not for invariant-checking.
    pub fn snapshot(&self) -> AllocatorStatsSnapshot {
        AllocatorStatsSnapshot {
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            bytes_freed: self.bytes_freed.load(Ordering::Relaxed),
            super_blocks_created: self.super_blocks_created.load(Ordering::Relaxed),
            super_blocks_live: self.super_blocks_live.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            large_allocations: self.large_allocations.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time read of [`AllocatorStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorStatsSnapshot {
    /// Total bytes ever handed out (not currently-live bytes).
    pub bytes_allocated: u64,
    /// Total bytes ever freed.
    pub bytes_freed: u64,
    /// Total super-blocks ever constructed.
    pub super_blocks_created: usize,
    /// Super-blocks currently live (in a bin or the global cache).
    pub super_blocks_live: usize,
    /// Times `GlobalCache::acquire` found a spare super-block.
    pub cache_hits: u64,
    /// Times `GlobalCache::acquire` had to construct a fresh super-block.
    pub cache_misses: u64,
    /// Allocations routed through the large-block path (> 256 bytes).
    pub large_allocations: u64,
}
