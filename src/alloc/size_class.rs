//! The fixed size-class table shared by every super-block.

/// Number of distinct size classes.
pub const NUM_CLASSES: usize = 6;

/// The size classes, in bytes, smallest first.
///
/// Every allocation request of `n <= 256` bytes is rounded up to the
/// smallest class that fits; anything larger bypasses the slab path
/// entirely (see [`crate::alloc::local_pool::LocalPool::alloc`]).
pub const CLASS_SIZES: [usize; NUM_CLASSES] = [8, 16, 32, 64, 128, 256];

/// The largest request still served by the slab path.
pub const MAX_CLASS_SIZE: usize = CLASS_SIZES[NUM_CLASSES - 1];

/// One super-block's raw footprint, header included.
pub const SUPER_BLOCK_SIZE: usize = 4096;

/// Returns the index into [`CLASS_SIZES`] of the smallest class that can
/// hold `n` bytes, or `None` if `n` exceeds [`MAX_CLASS_SIZE`].
#[inline]
pub fn class_index_for_size(n: usize) -> Option<usize> {
    CLASS_SIZES.iter().position(|&class| class >= n)
}

/// Returns the index into [`CLASS_SIZES`] matching `class_size` exactly, or
/// `None` if `class_size` is not one of the six classes.
#[inline]
pub fn class_index_for_class(class_size: usize) -> Option<usize> {
    CLASS_SIZES.iter().position(|&class| class == class_size)
}
