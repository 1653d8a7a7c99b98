//! The process-wide super-block registry.
//!
//! `MainPool` is the single true owner of every super-block: threads only
//! ever hold a borrowed [`NonNull`] into one, obtained from
//! [`MainPool::acquire`] and given back via [`MainPool::release`]. This
//! mirrors the original `main_pool`'s `used_blocks` set, just made explicit
//! instead of manual.

use std::alloc::Layout;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::NonNull;

use parking_lot::ReentrantMutex;

use super::error::{AllocError, AllocResult};
use super::global_cache::GlobalCache;
use super::size_class::class_index_for_class;
use super::stats::{AllocatorStats, AllocatorStatsSnapshot};
use super::superblock::SuperBlock;

struct Inner {
    cache: GlobalCache,
    /// Super-blocks currently checked out to some thread's `LocalPool`.
    active: Vec<Box<SuperBlock>>,
    /// Allocations that bypassed the slab path (> 256 bytes), keyed by
    /// address so a later `free_foreign` can recover their `Layout`.
    large: HashMap<usize, Layout>,
}

/// The process-lifetime registry behind every [`crate::alloc::LocalPool`].
///
/// Guarded by a [`ReentrantMutex`] rather than a plain mutex because a
/// `LocalPool`'s destructor can call back into `MainPool::release` while
/// already holding it (e.g. returning several super-blocks in one teardown
/// that also triggers a large-allocation free).
pub struct MainPool {
    inner: ReentrantMutex<RefCell<Inner>>,
    stats: AllocatorStats,
}

impl MainPool {
    pub fn new() -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(Inner {
                cache: GlobalCache::new(),
                active: Vec::new(),
                large: HashMap::new(),
            })),
            stats: AllocatorStats::new(),
        }
    }

    /// Counters accumulated across every thread's `LocalPool`.
    pub fn stats(&self) -> AllocatorStatsSnapshot {
        self.stats.snapshot()
    }

    /// Checks out a super-block for `class_idx`, recycling an idle one from
    /// the cache or constructing a fresh one.
    pub(crate) fn acquire(&self, class_idx: usize) -> NonNull<SuperBlock> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        let sb = inner.cache.acquire(class_idx, &self.stats);
        inner.active.push(sb);
        // SAFETY: we just pushed this box; `Vec` reallocation moves the
        // `Box` pointer, never the pointee, so the address is stable until
        // the block is removed from `active` in `release`.
        NonNull::from(&**inner.active.last().expect("just pushed"))
    }

    /// Returns a fully-drained super-block to the cache for reuse.
    ///
    /// # Safety
    /// `sb` must be a pointer previously returned by [`MainPool::acquire`]
    /// on this pool, not currently referenced by any `LocalPool` bin.
    pub(crate) unsafe fn release(&self, sb: NonNull<SuperBlock>) {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        let pos = inner
            .active
            .iter()
            .position(|b| std::ptr::eq(b.as_ref(), sb.as_ptr()))
            .expect("release called with a super-block MainPool didn't hand out");
        let block = inner.active.remove(pos);
        let class_idx = class_index_for_class(block.class_size()).expect("valid class size");
        // Returning to the cache is not destruction: the block stays live,
        // just idle, so `super_blocks_live` is untouched here. It is only
        // ever constructed (in `GlobalCache::acquire`'s cache-miss branch)
        // and never torn down, so `super_blocks_live` tracks every
        // super-block this pool has built for as long as the process runs.
        inner.cache.release(class_idx, block);
    }

    /// Allocates directly from the system allocator for requests above the
    /// largest size class, recording the layout so a later free can be
    /// recognized as a large allocation rather than a foreign pointer.
    pub(crate) fn alloc_large(&self, layout: Layout) -> AllocResult<NonNull<u8>> {
        // SAFETY: `layout` is caller-validated to be non-zero-sized with a
        // valid alignment (checked in `LocalPool::alloc` before routing
        // here).
        let raw = unsafe { std::alloc::alloc(layout) };
        let ptr = NonNull::new(raw)
            .ok_or(AllocError::OutOfMemory { size: layout.size(), align: layout.align() })?;

        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        inner.large.insert(ptr.as_ptr() as usize, layout);
        self.stats.record_large_allocation();
        self.stats.record_alloc(layout.size());
        Ok(ptr)
    }

    /// Frees a pointer that a `LocalPool` could not recognize as its own:
    /// either a large allocation, or a bin belonging to another thread's
    /// active super-block.
    ///
    /// # Safety
    /// `ptr` must currently be allocated, either via [`MainPool::alloc_large`]
    /// or via some thread's `LocalPool::alloc` routed through a super-block
    /// this pool owns.
    pub(crate) unsafe fn free_foreign(&self, ptr: NonNull<u8>) -> AllocResult<()> {
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();

        if let Some(layout) = inner.large.remove(&(ptr.as_ptr() as usize)) {
            // SAFETY: `layout` is the exact layout this address was
            // allocated with in `alloc_large`.
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
            self.stats.record_free(layout.size());
            return Ok(());
        }

        if let Some(owner) = inner.active.iter().find(|b| b.owns(ptr)) {
            owner.free_foreign(ptr);
            self.stats.record_free(owner.class_size());
            return Ok(());
        }

        Err(AllocError::ForeignPointer(ptr.as_ptr()))
    }

    /// Records a same-thread allocation satisfied directly by a `LocalPool`
    /// bin, without going through [`MainPool::alloc_large`].
    pub(crate) fn record_alloc(&self, bytes: usize) {
        self.stats.record_alloc(bytes);
    }

    /// Records a same-thread free satisfied directly by a `LocalPool` bin,
    /// without going through [`MainPool::free_foreign`].
    pub(crate) fn record_free(&self, bytes: usize) {
        self.stats.record_free(bytes);
    }
}

impl Default for MainPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_recycles_through_the_cache() {
        let pool = MainPool::new();
        let sb = pool.acquire(0);
        let before = pool.stats();
        assert_eq!(before.super_blocks_created, 1);

        // SAFETY: `sb` came straight from `acquire` and nothing has taken a
        // bin from it, so it is uncontested and safe to release.
        unsafe { pool.release(sb) };
        let sb2 = pool.acquire(0);
        let after = pool.stats();
        assert_eq!(after.super_blocks_created, 1, "second acquire should hit the cache, not build anew");
        unsafe { pool.release(sb2) };
    }

    #[test]
    fn repeated_acquire_release_cycles_stay_balanced() {
        let pool = MainPool::new();
        for _ in 0..50 {
            let sb = pool.acquire(0);
            // SAFETY: freshly acquired and uncontested.
            unsafe { pool.release(sb) };
        }
        let snapshot = pool.stats();
        assert_eq!(snapshot.super_blocks_created, 1, "every cycle after the first should hit the cache");
        assert_eq!(snapshot.super_blocks_live, 1, "recycling through the cache must not underflow live count");
    }

    #[test]
    fn large_allocations_round_trip_through_free_foreign() {
        let pool = MainPool::new();
        let layout = Layout::from_size_align(4096, 8).unwrap();
        let ptr = pool.alloc_large(layout).unwrap();
        assert_eq!(pool.stats().large_allocations, 1);

        // SAFETY: `ptr` was allocated above with `layout` and not yet freed.
        unsafe { pool.free_foreign(ptr).unwrap() };
    }

    #[test]
    fn free_foreign_rejects_unrecognized_pointers() {
        let pool = MainPool::new();
        let mut x = 0u8;
        let bogus = NonNull::from(&mut x);
        // SAFETY: we are deliberately passing a pointer MainPool never
        // allocated, to exercise the error path; `free_foreign` does not
        // dereference it before recognizing it as unrecognized.
        let err = unsafe { pool.free_foreign(bogus).unwrap_err() };
        assert!(matches!(err, AllocError::ForeignPointer(_)));
    }
}
