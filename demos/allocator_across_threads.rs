//! Installs the slab allocator as the process allocator and churns
//! allocations across a handful of threads.

use slab_pool::GlobalSlabAllocator;

#[global_allocator]
static ALLOCATOR: GlobalSlabAllocator = GlobalSlabAllocator::new();

fn main() {
    let mut handles = Vec::new();
    for t in 0..4 {
        handles.push(std::thread::spawn(move || {
            let mut boxes: Vec<Box<[u8; 32]>> = (0..2_000).map(|_| Box::new([0u8; 32])).collect();
            for (i, b) in boxes.iter_mut().enumerate() {
                b[0] = (t * 31 + i) as u8;
            }
            boxes.len()
        }));
    }

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    println!("allocated and freed {total} objects across 4 threads");

    let big: Vec<u8> = Vec::with_capacity(64 * 1024);
    println!("large allocation ok, capacity = {}", big.capacity());
}
