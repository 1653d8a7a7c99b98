//! `SuperBlock`: a 4 KiB region split into equal-sized bins of one class.
//!
//! # Safety
//!
//! A super-block's freelist (`inner`) is touched without synchronization by
//! its owning thread's fast path (`allocate`, `free_local_unchecked`,
//! `drain_deferred`). The only path that may run on another thread is
//! [`SuperBlock::free_foreign`], which only ever pushes onto the
//! `parking_lot::Mutex`-guarded deferred queue — it never touches `inner`
//! directly. `drain_deferred` folds that queue into the freelist, but only
//! the owner calls it (from `free_local` and `SizeClassBin::update`), so
//! `inner` never has two writers at once.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::{AllocError, AllocResult};
use super::size_class::SUPER_BLOCK_SIZE;

/// Nominal overhead budgeted for the header fields below, mirroring the
/// `super_block_header_t` embedded in the original C++ layout. Our header
/// lives in ordinary Rust struct fields rather than sharing the 4 KiB
/// region with the bins, but we still size `capacity` as if it did, so the
/// bin counts match the design this was modeled on.
const HEADER_OVERHEAD: usize = 64;

/// Intrusive freelist node: when a bin is free, its first machine word holds
/// a pointer to the next free bin.
#[repr(C)]
struct FreeNode {
    next: *mut FreeNode,
}

struct Inner {
    free_head: *mut FreeNode,
}

/// One contiguous 4 KiB region divided into bins of `class_size` bytes.
pub struct SuperBlock {
    class_size: usize,
    capacity: usize,
    data: NonNull<u8>,
    data_layout: Layout,
    inner: std::cell::UnsafeCell<Inner>,
    free_count: AtomicUsize,
    deferred: parking_lot::Mutex<Vec<usize>>,
}

// SAFETY: `data` is an owned heap allocation freed exactly once in `Drop`.
// `inner` is only ever accessed by the single owning thread as documented
// above; `deferred` and `free_count` are independently synchronized
// (a `Mutex` and an atomic respectively), so sending or sharing a
// `SuperBlock` across threads cannot race on them.
unsafe impl Send for SuperBlock {}
// SAFETY: see `Send` impl; cross-thread access is limited to `free_foreign`
// and `owns`, both of which only read immutable fields or the mutex-guarded
// queue.
unsafe impl Sync for SuperBlock {}

impl SuperBlock {
    /// Constructs a new super-block for `class_size`-byte bins, threading a
    /// freelist through every bin.
    ///
    /// # Panics
    /// Panics if `class_size` cannot hold a `FreeNode` pointer (i.e. is
    /// smaller than a machine word) or the system allocator fails — both are
    /// programmer errors for this crate's fixed {8,16,...,256} class table,
    /// never a user-reachable input.
    pub fn new(class_size: usize) -> Self {
        assert!(
            class_size >= std::mem::size_of::<*mut FreeNode>(),
            "class size {class_size} too small to hold a freelist pointer"
        );

        let capacity = (SUPER_BLOCK_SIZE - HEADER_OVERHEAD) / class_size;
        assert!(capacity > 0, "class size {class_size} leaves no room for bins");

        let data_size = capacity * class_size;
        let data_layout = Layout::from_size_align(data_size, std::mem::align_of::<*mut FreeNode>())
            .expect("super-block layout is always valid for our fixed class sizes");

        // SAFETY: `data_layout` has a non-zero size (checked by `capacity >
        // 0` above) and a valid alignment from `align_of`.
        let data = unsafe { alloc::alloc(data_layout) };
        let data = NonNull::new(data).unwrap_or_else(|| alloc::handle_alloc_error(data_layout));

        // Thread the freelist through every bin, last bin pointing to null.
        // SAFETY: each `offset` is `< data_size` and a multiple of
        // `class_size >= size_of::<*mut FreeNode>()`, so every node is
        // in-bounds, non-overlapping with its neighbors, and has room for a
        // `FreeNode`. The buffer was just allocated and is not yet visible
        // to any other thread.
        unsafe {
            let mut offset = 0usize;
            let mut prev: *mut FreeNode = std::ptr::null_mut();
            while offset < data_size {
                let node = data.as_ptr().add(offset).cast::<FreeNode>();
                if !prev.is_null() {
                    (*prev).next = node;
                }
                (*node).next = std::ptr::null_mut();
                prev = node;
                offset += class_size;
            }
        }

        Self {
            class_size,
            capacity,
            data,
            data_layout,
            inner: std::cell::UnsafeCell::new(Inner { free_head: data.as_ptr().cast() }),
            free_count: AtomicUsize::new(capacity),
            deferred: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// The size class this super-block serves.
    pub fn class_size(&self) -> usize {
        self.class_size
    }

    /// Total number of bins in this super-block.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bins currently free. Safe to call from any thread (it's atomic) but
    /// only advisory unless called by the owner, since a concurrent foreign
    /// free only updates this after the owner next drains the deferred
    /// queue.
    pub fn free_count(&self) -> usize {
        self.free_count.load(Ordering::Relaxed)
    }

    /// Whether every bin is free — the balance property used by tests.
    pub fn is_empty(&self) -> bool {
        self.free_count() == self.capacity
    }

    /// Returns `true` iff `ptr` falls inside this super-block's bin region
    /// at a bin-aligned offset.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let base = self.data.as_ptr() as usize;
        let end = base + self.capacity * self.class_size;
        let addr = ptr.as_ptr() as usize;
        addr >= base && addr < end && (addr - base) % self.class_size == 0
    }

    /// Pops the freelist head. Must only be called by the owning thread.
    ///
    /// Returns [`AllocError::InvalidSize`] if `requested` does not fit this
    /// super-block's class, or `None` if the freelist is empty (the
    /// internal `Exhausted` condition — callers recover by fetching another
    /// super-block, so it is not part of the public error taxonomy).
    pub(crate) fn allocate(&self, requested: usize) -> AllocResult<Option<NonNull<u8>>> {
        if requested > self.class_size {
            return Err(AllocError::InvalidSize { requested, class_size: self.class_size });
        }

        // SAFETY: owning-thread-only access, per the module invariant.
        let inner = unsafe { &mut *self.inner.get() };
        if inner.free_head.is_null() {
            return Ok(None);
        }

        // SAFETY: `free_head` always points at a live node threaded by
        // `new` or relinked by a prior free; dereferencing it to read `next`
        // is in-bounds by construction.
        let popped = inner.free_head;
        inner.free_head = unsafe { (*popped).next };
        self.free_count.fetch_sub(1, Ordering::Relaxed);
        Ok(NonNull::new(popped.cast()))
    }

    /// Frees a pointer known to belong to this super-block, relinking it
    /// onto the freelist and draining any deferred foreign frees. Must only
    /// be called by the owning thread.
    ///
    /// Returns [`AllocError::ForeignPointer`] if `ptr` does not in fact
    /// belong to this super-block — a contract violation by the caller,
    /// since [`SuperBlock::owns`] should always be checked first.
    pub(crate) fn free_local(&self, ptr: NonNull<u8>) -> AllocResult<()> {
        if !self.owns(ptr) {
            return Err(AllocError::ForeignPointer(ptr.as_ptr()));
        }
        // SAFETY: just confirmed ownership, so `ptr` is a live bin belonging
        // to this super-block's data region.
        unsafe { self.free_local_unchecked(ptr) };
        self.drain_deferred();
        Ok(())
    }

    /// SAFETY: `ptr` must be a bin owned by this super-block (see
    /// [`SuperBlock::owns`]) that is currently allocated, and this must be
    /// called only by the owning thread.
    unsafe fn free_local_unchecked(&self, ptr: NonNull<u8>) {
        let inner = unsafe { &mut *self.inner.get() };
        let node = ptr.as_ptr().cast::<FreeNode>();
        unsafe { (*node).next = inner.free_head };
        inner.free_head = node;
        self.free_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Enqueues a pointer for deferred freeing from a thread other than the
    /// owner. The owner folds this queue into the freelist the next time it
    /// calls [`SuperBlock::free_local`] or [`SuperBlock::drain_deferred`].
    pub(crate) fn free_foreign(&self, ptr: NonNull<u8>) {
        debug_assert!(self.owns(ptr), "free_foreign called with a pointer this block doesn't own");
        self.deferred.lock().push(ptr.as_ptr() as usize);
    }

    /// Folds every pending deferred-free pointer into the freelist. Must
    /// only be called by the owning thread.
    pub(crate) fn drain_deferred(&self) {
        let pending: Vec<usize> = std::mem::take(&mut *self.deferred.lock());
        for addr in pending {
            // SAFETY: every address was pushed by `free_foreign`, which
            // only accepts pointers this super-block owns.
            let ptr = NonNull::new(addr as *mut u8).expect("deferred-free addresses are never null");
            unsafe { self.free_local_unchecked(ptr) };
        }
    }
}

impl Drop for SuperBlock {
    fn drop(&mut self) {
        // SAFETY: `data` was allocated with `data_layout` in `new` and is
        // dropped exactly once here.
        unsafe { alloc::dealloc(self.data.as_ptr(), self.data_layout) };
    }
}
