//! The MPMC task queue (`spec.md` §4.D).
//!
//! The C original reserves a slot (`get_slot`) before populating it, to avoid
//! a data race across raw pointers shared with other threads. Here each
//! `Task` owns its data outright, so `add`/`get` can push/pop atomically
//! without a separate reservation step; `get_slot` has no counterpart, per
//! the note in `SPEC_FULL.md` §5.
//!
//! Grounded on `crossbeam_queue::SegQueue`, the lock-free MPMC primitive used
//! across the retrieval pack for the same "unordered, unbounded bag" shape
//! (e.g. `neerajchowdary889-DMXP-MPMC`).

use crossbeam_queue::SegQueue;

/// An unbounded MPMC bag. Ordering is not guaranteed; fairness is not
/// required; `get` returns `None` when the queue is observed empty.
pub struct TaskQueue<T> {
    inner: SegQueue<T>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        TaskQueue {
            inner: SegQueue::new(),
        }
    }

    pub fn add(&self, task: T) {
        self.inner.push(task);
    }

    pub fn get(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn push_pop_is_linearizable_across_threads() {
        let q = Arc::new(TaskQueue::new());
        for i in 0..1000 {
            q.add(i);
        }
        let mut handles = Vec::new();
        for _ in 0..4 {
            let q = Arc::clone(&q);
            handles.push(thread::spawn(move || {
                let mut popped = Vec::new();
                while let Some(v) = q.get() {
                    popped.push(v);
                }
                popped
            }));
        }
        let mut all: Vec<i32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
        assert!(q.is_empty());
    }
}
