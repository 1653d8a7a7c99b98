//! A fine-grained concurrent priority heap.
//!
//! Structure (`length`, and which element lives at which index) is guarded
//! by a [`parking_lot::RwLock`]; only ever held briefly to clone out the
//! per-slot handles involved in one step. Element *contents* are guarded by
//! a `spin::Mutex` per slot. `sift_up`/`sift_down` lock strictly in
//! ascending index order (a node's parent always has a smaller index), so
//! two sifts can never deadlock against each other.

use std::sync::Arc;

use parking_lot::RwLock;
use spin::Mutex as SpinMutex;

type Slot<T> = Arc<SpinMutex<Option<(T, i32)>>>;

/// An array-backed binary min-heap ordered by an `i32` priority (smaller
/// sorts first), safe to insert into and extract from concurrently.
pub struct PriorityHeap<T> {
    shape: RwLock<Vec<Slot<T>>>,
}

impl<T> PriorityHeap<T> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self { shape: RwLock::new(Vec::new()) }
    }

    /// Number of items currently in the heap.
    pub fn len(&self) -> usize {
        self.shape.read().len()
    }

    /// Whether the heap currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `item` with `priority`, then restores heap order by sifting
    /// it up from the newly-occupied last slot.
    pub fn insert(&self, item: T, priority: i32) {
        let idx = {
            let mut shape = self.shape.write();
            let idx = shape.len();
            shape.push(Arc::new(SpinMutex::new(Some((item, priority)))));
            idx
        };
        self.sift_up(idx);
    }

    /// Removes and returns the minimum-priority item, or `None` if the heap
    /// is empty.
    pub fn extract_min(&self) -> Option<(T, i32)> {
        let removed = {
            let mut shape = self.shape.write();
            let last = shape.len().checked_sub(1)?;
            if last != 0 {
                // Move the last slot's contents to the root so the slot we
                // pop is the one we're about to return.
                let root = shape[0].clone();
                let tail = shape[last].clone();
                let mut root_guard = root.lock();
                let mut tail_guard = tail.lock();
                std::mem::swap(&mut *root_guard, &mut *tail_guard);
            }
            let tail = shape.pop().expect("checked non-empty above");
            tail.lock().take()
        };
        if !self.is_empty() {
            self.sift_down(0);
        }
        removed
    }

    fn sift_up(&self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;

            let (slot_parent, slot_child) = {
                let shape = self.shape.read();
                if idx >= shape.len() {
                    return;
                }
                (shape[parent].clone(), shape[idx].clone())
            };

            // Lock ascending by index: `parent < idx` always holds here.
            let mut parent_guard = slot_parent.lock();
            let mut child_guard = slot_child.lock();

            let should_swap = match (parent_guard.as_ref(), child_guard.as_ref()) {
                (Some((_, pp)), Some((_, cp))) => pp > cp,
                _ => false,
            };
            if should_swap {
                std::mem::swap(&mut *parent_guard, &mut *child_guard);
            }
            drop(parent_guard);
            drop(child_guard);

            if !should_swap {
                break;
            }
            idx = parent;
        }
    }

    fn sift_down(&self, mut idx: usize) {
        loop {
            let (slot_idx, slot_left, slot_right) = {
                let shape = self.shape.read();
                let len = shape.len();
                let left = 2 * idx + 1;
                let right = 2 * idx + 2;
                if left >= len {
                    return;
                }
                (
                    shape[idx].clone(),
                    shape[left].clone(),
                    if right < len { Some(shape[right].clone()) } else { None },
                )
            };

            // Lock ascending by index: `idx < left < right` always holds.
            let mut guard_idx = slot_idx.lock();
            let mut guard_left = slot_left.lock();
            let mut guard_right = slot_right.as_ref().map(|s| s.lock());

            let priority_of = |g: &Option<(T, i32)>| g.as_ref().map(|(_, p)| *p);
            let idx_priority = priority_of(&guard_idx);
            let left_priority = priority_of(&guard_left);
            let right_priority = guard_right.as_ref().and_then(|g| priority_of(g));

            let left_idx = 2 * idx + 1;
            let right_idx = 2 * idx + 2;

            let mut best = idx;
            let mut best_priority = idx_priority;
            if let Some(lp) = left_priority {
                if best_priority.map_or(true, |bp| lp < bp) {
                    best = left_idx;
                    best_priority = Some(lp);
                }
            }
            if let Some(rp) = right_priority {
                if best_priority.map_or(true, |bp| rp < bp) {
                    best = right_idx;
                }
            }

            if best == idx {
                return;
            }
            if best == left_idx {
                std::mem::swap(&mut *guard_idx, &mut *guard_left);
            } else {
                let guard_right = guard_right.as_mut().expect("best == right_idx implies it exists");
                std::mem::swap(&mut *guard_idx, &mut **guard_right);
            }
            drop(guard_idx);
            drop(guard_left);
            drop(guard_right);

            idx = best;
        }
    }
}

impl<T> Default for PriorityHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_priority_order() {
        let heap = PriorityHeap::new();
        for (item, priority) in [(5, 5), (3, 3), (7, 7), (1, 1), (4, 4)] {
            heap.insert(item, priority);
        }
        let mut out = Vec::new();
        while let Some((item, _)) = heap.extract_min() {
            out.push(item);
        }
        assert_eq!(out, vec![1, 3, 4, 5, 7]);
    }

    #[test]
    fn empty_heap_extracts_none() {
        let heap: PriorityHeap<i32> = PriorityHeap::new();
        assert_eq!(heap.extract_min(), None);
    }

    #[test]
    fn ties_are_preserved_as_a_valid_heap() {
        let heap = PriorityHeap::new();
        for i in 0..20 {
            heap.insert(i, i % 4);
        }
        let mut out = Vec::new();
        while let Some((item, priority)) = heap.extract_min() {
            out.push((item, priority));
        }
        let priorities: Vec<_> = out.iter().map(|&(_, p)| p).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn concurrent_inserts_and_extracts_preserve_count() {
        use std::sync::Arc as StdArc;
        let heap = StdArc::new(PriorityHeap::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let heap = heap.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..200 {
                    heap.insert(t * 1000 + i, i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(heap.len(), 1600);

        let mut count = 0;
        while heap.extract_min().is_some() {
            count += 1;
        }
        assert_eq!(count, 1600);
    }
}
