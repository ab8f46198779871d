//! Bounded FIFO delivery queue.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Order-preserving queue shared between a session sink and pull consumers.
///
/// Holds at most `capacity` records; pushing past that evicts from the front,
/// so a consumer that stops pulling loses the oldest records first.
pub(crate) struct RecordQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> RecordQueue<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        RecordQueue {
            items: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `batch` in order and returns how many old records were evicted.
    pub(crate) fn push_all(&self, batch: Vec<T>) -> usize {
        let mut items = self.lock();
        items.extend(batch);
        let evicted = items.len().saturating_sub(self.capacity);
        items.drain(..evicted);
        evicted
    }

    /// Removes and returns up to `max` records from the front. Never waits.
    pub(crate) fn pop(&self, max: usize) -> Vec<T> {
        let mut items = self.lock();
        let n = max.min(items.len());
        items.drain(..n).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_preserves_arrival_order() {
        let queue = RecordQueue::new(10);
        queue.push_all(vec![1, 2, 3]);
        queue.push_all(vec![4, 5]);
        assert_eq!(queue.pop(2), vec![1, 2]);
        assert_eq!(queue.pop(10), vec![3, 4, 5]);
        assert!(queue.pop(3).is_empty());
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let queue = RecordQueue::new(3);
        assert_eq!(queue.push_all(vec![1, 2]), 0);
        assert_eq!(queue.push_all(vec![3, 4, 5]), 2);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(5), vec![3, 4, 5]);
    }

    #[test]
    fn test_pop_zero() {
        let queue = RecordQueue::new(3);
        queue.push_all(vec!["a"]);
        assert!(queue.pop(0).is_empty());
        assert_eq!(queue.len(), 1);
    }
}
