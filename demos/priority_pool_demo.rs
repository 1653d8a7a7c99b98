//! Submits work to a priority-ordered thread pool and prints completion
//! order alongside each task's priority.

use slab_pool::{PoolConfig, PriorityQueue, Task, ThreadPool};

fn main() {
    let pool: ThreadPool<PriorityQueue<Task>> = ThreadPool::new(PoolConfig { num_workers: 2 });

    let jobs = [("low-priority report", 9), ("user request", 1), ("background sweep", 5), ("health check", 2)];

    let futures: Vec<_> = jobs
        .iter()
        .map(|&(name, priority)| {
            pool.submit_with_priority(
                move || {
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    name
                },
                priority,
            )
        })
        .collect();

    for future in futures {
        match future.wait() {
            Ok(name) => println!("completed: {name}"),
            Err(err) => eprintln!("task failed: {err}"),
        }
    }

    let stats = pool.stats();
    println!(
        "submitted {} tasks, {} completed, {} failed",
        stats.tasks_submitted, stats.tasks_completed, stats.tasks_failed
    );
}
