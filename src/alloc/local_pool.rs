//! The per-thread entry point into the slab allocator.

use std::alloc::Layout;
use std::ptr::NonNull;

use super::error::{AllocError, AllocResult};
use super::main_pool::MainPool;
use super::size_class::{class_index_for_size, CLASS_SIZES, NUM_CLASSES};
use super::size_class_bin::SizeClassBin;

/// One thread's working set of [`SizeClassBin`]s, backed by a shared
/// [`MainPool`].
///
/// Requests that fit a size class (`<= 256` bytes, alignment no stricter
/// than the class) are served from `bins`; anything larger goes straight to
/// [`MainPool::alloc_large`].
pub struct LocalPool {
    bins: [SizeClassBin; NUM_CLASSES],
    main_pool: &'static MainPool,
}

impl LocalPool {
    pub(crate) fn new(main_pool: &'static MainPool) -> Self {
        Self {
            bins: std::array::from_fn(|idx| SizeClassBin::new(idx, main_pool)),
            main_pool,
        }
    }

    /// Allocates memory satisfying `layout`.
    pub fn alloc(&mut self, layout: Layout) -> AllocResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Err(AllocError::InvalidLayout(layout));
        }

        if let Some(idx) = class_index_for_size(layout.size()) {
            if layout.align() <= CLASS_SIZES[idx] {
                let ptr = self.bins[idx].allocate(layout.size())?;
                self.main_pool.record_alloc(layout.size());
                return Ok(ptr);
            }
        }

        self.main_pool.alloc_large(layout)
    }

    /// Frees a pointer previously returned by [`LocalPool::alloc`] with the
    /// same `layout`, on any thread.
    ///
    /// # Safety
    /// `ptr` must currently be allocated with exactly `layout`, and must not
    /// be used again after this call.
    pub unsafe fn free(&mut self, ptr: NonNull<u8>, layout: Layout) -> AllocResult<()> {
        if let Some(idx) = class_index_for_size(layout.size()) {
            if layout.align() <= CLASS_SIZES[idx] && self.bins[idx].free_if_owned(ptr)? {
                self.main_pool.record_free(layout.size());
                return Ok(());
            }
        }

        // Either a large allocation, or a bin owned by another thread's
        // super-block — both routed through the shared registry.
        // SAFETY: forwarded from this function's own contract.
        unsafe { self.main_pool.free_foreign(ptr) }
    }
}
