//! Requests walking every size class, plus the large-allocation bypass.

use std::alloc::{GlobalAlloc, Layout};

use slab_pool::GlobalSlabAllocator;

#[test]
fn every_class_and_one_large_size_round_trip() {
    let allocator = GlobalSlabAllocator::new();
    let sizes = [8usize, 16, 32, 64, 128, 256, 512];

    let mut live = Vec::new();
    for &size in &sizes {
        let layout = Layout::from_size_align(size, 8).unwrap();
        for _ in 0..64 {
            let ptr = unsafe { allocator.alloc(layout) };
            assert!(!ptr.is_null(), "size {size} allocation failed");
            live.push((ptr, layout));
        }
    }

    for (ptr, layout) in live {
        unsafe { allocator.dealloc(ptr, layout) };
    }
}

#[test]
fn large_allocation_is_tracked_separately_from_slab_classes() {
    let allocator = GlobalSlabAllocator::new();
    let small = Layout::from_size_align(64, 8).unwrap();
    let large = Layout::from_size_align(8192, 8).unwrap();

    let small_ptr = unsafe { allocator.alloc(small) };
    let large_ptr = unsafe { allocator.alloc(large) };
    assert!(!small_ptr.is_null());
    assert!(!large_ptr.is_null());
    assert_ne!(small_ptr as usize, large_ptr as usize);

    unsafe {
        allocator.dealloc(small_ptr, small);
        allocator.dealloc(large_ptr, large);
    }
}

#[test]
fn interleaved_mixed_size_churn_stays_correct() {
    let allocator = GlobalSlabAllocator::new();
    let sizes = [8usize, 16, 32, 64, 128, 256];
    let mut live: Vec<(*mut u8, Layout)> = Vec::new();

    for round in 0..20 {
        let size = sizes[round % sizes.len()];
        let layout = Layout::from_size_align(size, 8).unwrap();
        let ptr = unsafe { allocator.alloc(layout) };
        assert!(!ptr.is_null());
        live.push((ptr, layout));

        if live.len() > 10 {
            let (ptr, layout) = live.remove(0);
            unsafe { allocator.dealloc(ptr, layout) };
        }
    }

    for (ptr, layout) in live {
        unsafe { allocator.dealloc(ptr, layout) };
    }
}
