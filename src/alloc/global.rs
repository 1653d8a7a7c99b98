//! Installs the slab allocator as the process's `#[global_allocator]`.
//!
//! # Bootstrapping
//!
//! Every piece of allocator-internal bookkeeping — a super-block's 4 KiB
//! data region, a `Box<SuperBlock>` in the global cache, a growing `Vec` of
//! active blocks, the large-allocation map — is itself an ordinary heap
//! allocation. Once this type is installed as `#[global_allocator]`, those
//! allocations would otherwise re-enter [`GlobalSlabAllocator::alloc`] while
//! [`LOCAL_POOL`]'s `RefCell` is already borrowed, panicking with
//! `BorrowMutError` (or, worse, recursing without end on the large-object
//! path). [`IN_ALLOCATOR`] guards against this: it is set for the duration
//! of one top-level `alloc`/`dealloc` call, and any allocation requested
//! while it is already set — necessarily a nested request for our own
//! metadata, never a second, unrelated user request — is forwarded straight
//! to [`System`], bypassing `LOCAL_POOL` entirely.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use std::sync::OnceLock;

use super::local_pool::LocalPool;
use super::main_pool::MainPool;

static MAIN_POOL: OnceLock<MainPool> = OnceLock::new();

thread_local! {
    static LOCAL_POOL: RefCell<Option<LocalPool>> = const { RefCell::new(None) };
    static IN_ALLOCATOR: Cell<bool> = const { Cell::new(false) };
}

/// Marks this thread as already servicing a slab-allocator request. Held for
/// the duration of one top-level `alloc`/`dealloc` call; `enter` returns
/// `None` if the flag was already set, which callers use to route nested
/// (metadata) allocations straight to [`System`] instead of recursing.
struct ReentrancyGuard;

impl ReentrancyGuard {
    fn enter() -> Option<Self> {
        if IN_ALLOCATOR.with(Cell::get) {
            None
        } else {
            IN_ALLOCATOR.with(|flag| flag.set(true));
            Some(Self)
        }
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        IN_ALLOCATOR.with(|flag| flag.set(false));
    }
}

/// A [`GlobalAlloc`] backed by a per-thread [`LocalPool`] over a shared
/// [`MainPool`], suitable for:
///
/// ```ignore
/// #[global_allocator]
/// static ALLOCATOR: slab_pool::GlobalSlabAllocator = slab_pool::GlobalSlabAllocator::new();
/// ```
///
/// Every thread lazily gets its own [`LocalPool`] on first use; the
/// underlying [`MainPool`] is shared process-wide and lives for the
/// program's duration.
#[derive(Debug, Default)]
pub struct GlobalSlabAllocator;

impl GlobalSlabAllocator {
    /// Creates the allocator. Cheap and side-effect-free: the shared
    /// [`MainPool`] and per-thread pools are created lazily on first use.
    pub const fn new() -> Self {
        Self
    }

    fn main_pool(&self) -> &'static MainPool {
        MAIN_POOL.get_or_init(MainPool::new)
    }
}

// SAFETY: `GlobalAlloc::alloc`/`dealloc` below uphold the trait's contract —
// `alloc` returns either a null pointer or one valid for `layout`, and
// `dealloc` requires the caller to pass back a pointer/layout pair it
// previously returned, exactly as `LocalPool::alloc`/`free` require.
unsafe impl GlobalAlloc for GlobalSlabAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let Some(_guard) = ReentrancyGuard::enter() else {
            // Nested call made while building our own metadata (a
            // super-block's data region, a `Box<SuperBlock>`, a growing
            // `Vec`/`HashMap`) — hand it to the system allocator directly.
            // SAFETY: forwarded from this function's own `GlobalAlloc`
            // contract on `layout`.
            return unsafe { System.alloc(layout) };
        };

        let main_pool = self.main_pool();
        LOCAL_POOL.with(|cell| {
            let mut slot = cell.borrow_mut();
            let local = slot.get_or_insert_with(|| LocalPool::new(main_pool));
            match local.alloc(layout) {
                Ok(ptr) => ptr.as_ptr(),
                Err(_) => std::ptr::null_mut(),
            }
        })
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let Some(_guard) = ReentrancyGuard::enter() else {
            // SAFETY: same pointer/layout contract as this function's own
            // `GlobalAlloc::dealloc` — the pointer was handed out by the
            // matching nested `System.alloc` call above.
            unsafe { System.dealloc(ptr, layout) };
            return;
        };

        let Some(ptr) = NonNull::new(ptr) else { return };
        let main_pool = self.main_pool();
        LOCAL_POOL.with(|cell| {
            let mut slot = cell.borrow_mut();
            let local = slot.get_or_insert_with(|| LocalPool::new(main_pool));
            // SAFETY: forwarded from this function's own `GlobalAlloc`
            // contract — `ptr`/`layout` describe a still-live allocation
            // this allocator previously handed out.
            let _ = unsafe { local.free(ptr, layout) };
        });
    }
}
