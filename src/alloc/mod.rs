//! A Hoard-style thread-local slab allocator.
//!
//! Small requests (`<= 256` bytes) are served from a per-thread
//! [`LocalPool`], itself built from [`SizeClassBin`]s of fixed-size
//! [`SuperBlock`]s recycled through a shared [`MainPool`]. Larger requests
//! go straight to the system allocator, tracked by `MainPool` so they can
//! still be freed from any thread.
//!
//! [`GlobalSlabAllocator`] wires this up as a `#[global_allocator]`; the
//! pieces underneath are also usable on their own.

mod error;
mod global;
mod global_cache;
mod local_pool;
mod main_pool;
mod size_class;
mod size_class_bin;
mod stats;
mod superblock;

pub use error::{AllocError, AllocResult};
pub use global::GlobalSlabAllocator;
pub use local_pool::LocalPool;
pub use main_pool::MainPool;
pub use size_class::{CLASS_SIZES, MAX_CLASS_SIZE, NUM_CLASSES, SUPER_BLOCK_SIZE};
pub use stats::{AllocatorStats, AllocatorStatsSnapshot};
