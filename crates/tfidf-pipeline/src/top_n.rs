//! Bounded top-N selection over a stream of items.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Keeps the `capacity` greatest items pushed into it.
///
/// Backed by a min-heap of at most `capacity` entries: each push is `O(log N)` and
/// evicts the current minimum once the bound is exceeded. Which items survive is fully
/// determined by `T`'s total order, so the result does not depend on push order.
#[derive(Debug, Clone)]
pub struct BoundedTopN<T: Ord> {
    /// Min-heap of retained items.
    heap: BinaryHeap<Reverse<T>>,
    /// Maximum number of retained items.
    capacity: usize,
}

impl<T: Ord> BoundedTopN<T> {
    /// Creates a selector retaining at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Offers an item.
    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(item));
            return;
        }
        if self.heap.peek().is_some_and(|Reverse(min)| item > *min) {
            self.heap.pop();
            self.heap.push(Reverse(item));
        }
    }

    /// Number of retained items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The retention bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drains the retained items, greatest first.
    pub fn into_sorted_vec(self) -> Vec<T> {
        // Ascending order of `Reverse<T>` is descending order of `T`
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(item)| item)
            .collect()
    }
}

/// A term scored by raw frequency.
///
/// Ordered so that "greater" means "ranks higher": a higher frequency wins, and among
/// equal frequencies the lexicographically smaller term wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTerm {
    /// Raw frequency of the term.
    pub frequency: u64,
    /// The term.
    pub term: String,
}

impl Ord for RankedTerm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.frequency
            .cmp(&other.frequency)
            .then_with(|| other.term.cmp(&self.term))
    }
}

impl PartialOrd for RankedTerm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
