//! A single thread's working set of super-blocks for one size class.

use std::ptr::NonNull;

use super::error::AllocResult;
use super::main_pool::MainPool;
use super::superblock::SuperBlock;

/// Super-blocks a thread is currently drawing from for one size class,
/// kept sorted so the fullest block is tried first.
///
/// Fill-biased allocation packs live objects into as few super-blocks as
/// possible, so the rest can drain back to empty and be returned to
/// [`MainPool`] for other threads to reuse.
pub(crate) struct SizeClassBin {
    class_idx: usize,
    blocks: Vec<NonNull<SuperBlock>>,
    main_pool: &'static MainPool,
}

// SAFETY: a `SizeClassBin` is only ever touched by the thread whose
// `LocalPool` owns it; the `NonNull<SuperBlock>` entries point at
// super-blocks that are themselves `Send + Sync` (see `superblock.rs`).
unsafe impl Send for SizeClassBin {}

impl SizeClassBin {
    pub(crate) fn new(class_idx: usize, main_pool: &'static MainPool) -> Self {
        Self { class_idx, blocks: Vec::new(), main_pool }
    }

    /// Re-sorts the working set ascending by free space, so the fullest
    /// block sits at the front and fully-empty blocks drift to the back.
    fn resort(&mut self) {
        self.blocks.sort_by_key(|&p| unsafe { p.as_ref().free_count() });
    }

    /// Returns any fully-drained blocks beyond the one we keep on hand to
    /// avoid immediately re-fetching from `MainPool` on the next request.
    fn release_excess_empty(&mut self) {
        while self.blocks.len() > 1 {
            let last = *self.blocks.last().expect("len > 1");
            // SAFETY: `last` is one of our own tracked blocks.
            if !unsafe { last.as_ref().is_empty() } {
                break;
            }
            self.blocks.pop();
            // SAFETY: `last` was obtained from `self.main_pool` and just
            // confirmed fully drained, so no bin inside it is live.
            unsafe { self.main_pool.release(last) };
        }
    }

    /// Allocates a `requested`-byte object from this size class, fetching a
    /// new super-block from `MainPool` if every block on hand is full.
    pub(crate) fn allocate(&mut self, requested: usize) -> AllocResult<NonNull<u8>> {
        loop {
            let candidate = self
                .blocks
                .iter()
                .copied()
                .find(|&p| unsafe { p.as_ref().free_count() } > 0);

            if let Some(sb_ptr) = candidate {
                // SAFETY: owning-thread-only access, guaranteed by the
                // `SizeClassBin`/`LocalPool` invariant.
                let sb = unsafe { sb_ptr.as_ref() };
                if let Some(ptr) = sb.allocate(requested)? {
                    self.resort();
                    return Ok(ptr);
                }
            }

            let fresh = self.main_pool.acquire(self.class_idx);
            self.blocks.push(fresh);
            self.resort();
        }
    }

    /// Frees `ptr` if one of our tracked blocks owns it, returning `true`.
    /// Returns `false` if no tracked block recognizes `ptr`, in which case
    /// the caller should route it through [`MainPool::free_foreign`].
    pub(crate) fn free_if_owned(&mut self, ptr: NonNull<u8>) -> AllocResult<bool> {
        let owner = self.blocks.iter().copied().find(|&p| unsafe { p.as_ref().owns(ptr) });
        let Some(sb_ptr) = owner else {
            return Ok(false);
        };
        // SAFETY: owning-thread-only access.
        let sb = unsafe { sb_ptr.as_ref() };
        sb.free_local(ptr)?;
        self.resort();
        self.release_excess_empty();
        Ok(true)
    }
}

impl Drop for SizeClassBin {
    fn drop(&mut self) {
        self.resort();
        // Give back every fully-drained block; a block still holding live
        // objects at thread exit stays registered in `MainPool::active`
        // (reachable for cross-thread frees) but is no longer reusable by
        // any `LocalPool` — an accepted, bounded leak rather than risking a
        // use-after-free by recycling a block with live bins.
        while let Some(&last) = self.blocks.last() {
            // SAFETY: checked empty immediately below before releasing.
            if !unsafe { last.as_ref().is_empty() } {
                break;
            }
            self.blocks.pop();
            // SAFETY: `last` came from `self.main_pool` and was just
            // confirmed empty.
            unsafe { self.main_pool.release(last) };
        }
    }
}
