use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slab_pool::PriorityHeap;

fn sequential_insert_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_insert_extract");
    for &n in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let heap = PriorityHeap::new();
                for i in 0..n {
                    heap.insert(i, (n - i) as i32);
                }
                while let Some(item) = heap.extract_min() {
                    black_box(item);
                }
            });
        });
    }
    group.finish();
}

fn concurrent_insert(c: &mut Criterion) {
    c.bench_function("concurrent_insert_8_threads", |b| {
        b.iter(|| {
            let heap = Arc::new(PriorityHeap::new());
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let heap = heap.clone();
                    std::thread::spawn(move || {
                        for i in 0..200 {
                            heap.insert((t, i), i);
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            black_box(heap.len());
        });
    });
}

criterion_group!(benches, sequential_insert_extract, concurrent_insert);
criterion_main!(benches);
