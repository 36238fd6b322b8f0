//! Shared work queue for the dispatch pool.

use std::sync::Arc;

use parking_lot::Mutex;

/// Stack-like queue of heterogeneous work items.
///
/// Push and pop happen at the same end (LIFO); clones share the same
/// storage, which is how producers and the worker pool see one queue.
pub struct WorkQueue<T> {
    items: Arc<Mutex<Vec<T>>>,
}

// Hand-written so cloning a queue never requires `T: Clone`; clones only
// duplicate the shared `Arc`, not the items.
impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an item for the pool to pick up.
    pub fn push(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Take the most recently pushed item, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().pop()
    }

    /// Number of queued items, for monitoring only.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_on_empty_queue_is_none() {
        let queue: WorkQueue<String> = WorkQueue::new();
        assert!(queue.try_pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_lifo_order() {
        let queue = WorkQueue::new();
        queue.push("first");
        queue.push("second");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_pop(), Some("second"));
        assert_eq!(queue.try_pop(), Some("first"));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_clones_share_storage() {
        let queue = WorkQueue::new();
        let producer = queue.clone();
        producer.push(1);
        assert_eq!(queue.try_pop(), Some(1));
    }
}
