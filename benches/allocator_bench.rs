use std::alloc::{GlobalAlloc, Layout};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slab_pool::GlobalSlabAllocator;

fn single_thread_alloc_free(c: &mut Criterion) {
    let allocator = GlobalSlabAllocator::new();
    let mut group = c.benchmark_group("single_thread_alloc_free");

    for &size in &[8usize, 32, 64, 256] {
        let layout = Layout::from_size_align(size, 8).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &layout, |b, &layout| {
            b.iter(|| {
                // SAFETY: `layout` is non-zero-sized and valid; the pointer
                // is freed with the same layout immediately after.
                let ptr = unsafe { allocator.alloc(layout) };
                black_box(ptr);
                unsafe { allocator.dealloc(ptr, layout) };
            });
        });
    }
    group.finish();
}

fn churn_many_live_objects(c: &mut Criterion) {
    let allocator = GlobalSlabAllocator::new();
    let layout = Layout::from_size_align(32, 8).unwrap();

    c.bench_function("churn_1000_live_objects", |b| {
        b.iter(|| {
            let mut ptrs = Vec::with_capacity(1_000);
            for _ in 0..1_000 {
                ptrs.push(unsafe { allocator.alloc(layout) });
            }
            for ptr in ptrs {
                unsafe { allocator.dealloc(ptr, layout) };
            }
        });
    });
}

criterion_group!(benches, single_thread_alloc_free, churn_many_live_objects);
criterion_main!(benches);
