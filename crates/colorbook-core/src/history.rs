//! Bounded undo history of full-buffer snapshots.

use crate::buffer::PixelBuffer;
use std::collections::VecDeque;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Stack of buffer snapshots, most recent last.
///
/// Snapshots are taken before a mutation. When the stack overflows its
/// limit, the oldest snapshot is evicted.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    snapshots: VecDeque<PixelBuffer>,
    limit: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::with_limit(MAX_UNDO_HISTORY)
    }
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            snapshots: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Push a deep copy of `buffer`.
    pub fn snapshot(&mut self, buffer: &PixelBuffer) {
        self.snapshots.push_back(buffer.clone());
        if self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
        }
    }

    /// Pop the most recent snapshot, or `None` when the history is empty.
    pub fn restore(&mut self) -> Option<PixelBuffer> {
        self.snapshots.pop_back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    /// A 1x1 buffer whose red channel tags the snapshot.
    fn tagged(tag: u8) -> PixelBuffer {
        PixelBuffer::filled(1, 1, Rgba::opaque(tag, 0, 0)).unwrap()
    }

    fn tag_of(buffer: &PixelBuffer) -> u8 {
        buffer.get(0, 0).unwrap().r
    }

    #[test]
    fn test_restore_empty() {
        let mut history = UndoHistory::new();
        assert!(history.restore().is_none());
    }

    #[test]
    fn test_lifo_order() {
        let mut history = UndoHistory::new();
        for tag in 1..=5 {
            history.snapshot(&tagged(tag));
        }
        // N = 5 pushes, M = 2 restores: next restore is the 3rd most recent.
        history.restore();
        history.restore();
        assert_eq!(tag_of(&history.restore().unwrap()), 3);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut history = UndoHistory::new();
        for tag in 1..=51 {
            history.snapshot(&tagged(tag));
        }
        assert_eq!(history.len(), MAX_UNDO_HISTORY);

        let mut tags = Vec::new();
        while let Some(buffer) = history.restore() {
            tags.push(tag_of(&buffer));
        }
        assert_eq!(tags, (2..=51).rev().collect::<Vec<u8>>());
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut history = UndoHistory::new();
        let mut buffer = tagged(7);
        history.snapshot(&buffer);
        buffer.set(0, 0, Rgba::WHITE).unwrap();
        assert_eq!(tag_of(&history.restore().unwrap()), 7);
    }

    #[test]
    fn test_custom_limit_and_clear() {
        let mut history = UndoHistory::with_limit(2);
        for tag in 1..=3 {
            history.snapshot(&tagged(tag));
        }
        assert_eq!(history.len(), 2);
        history.clear();
        assert!(history.is_empty());
    }
}
