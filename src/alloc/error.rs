//! Error types for the slab allocator.

use std::alloc::Layout;

/// Errors surfaced by the allocator.
///
/// `Exhausted` is deliberately absent here: a full super-block is always
/// recovered internally by [`crate::alloc::size_class_bin::SizeClassBin`]
/// fetching another one from [`crate::alloc::main_pool::MainPool`], and never
/// escapes past that point.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// No super-block was available from the cache and the system allocator
    /// refused to hand out a fresh one.
    #[error("out of memory requesting {size} bytes (align {align})")]
    OutOfMemory {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// A free was routed to a super-block that does not own the pointer.
    ///
    /// This is only constructed by [`crate::alloc::main_pool::MainPool`] when
    /// a foreign free cannot be matched to any live super-block and also
    /// fails as a large allocation; it should never occur for pointers this
    /// allocator produced.
    #[error("pointer {0:p} is not owned by any live super-block")]
    ForeignPointer(*const u8),

    /// A super-block received a request larger than its class size.
    #[error("requested size {requested} exceeds class size {class_size}")]
    InvalidSize {
        /// The size that was requested.
        requested: usize,
        /// The size class the request was routed to.
        class_size: usize,
    },

    /// The requested `Layout` is invalid (zero size, non-power-of-two
    /// alignment, or a size that would overflow address space).
    #[error("invalid layout: {0:?}")]
    InvalidLayout(Layout),
}

// SAFETY: `ForeignPointer` carries a raw pointer purely as an opaque
// identifier for diagnostics; it is never dereferenced by `AllocError` or
// anything that receives one.
unsafe impl Send for AllocError {}
// SAFETY: see `Send` impl above.
unsafe impl Sync for AllocError {}

/// Result alias for allocator operations.
pub type AllocResult<T> = Result<T, AllocError>;
