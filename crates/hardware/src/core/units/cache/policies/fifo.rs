//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Evicts lines in the order they were installed, regardless of reuse. Each set
//! keeps a round-robin pointer that only advances when the way it names is
//! refilled.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1) for every operation
//! - **Space Complexity:** O(S) where S is the number of sets

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Debug, Clone)]
pub struct FifoPolicy {
    /// Next way to be evicted, per set.
    next_way: Vec<usize>,
    ways: usize,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            next_way: vec![0; sets],
            ways: ways.max(1),
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn touch(&mut self, _set: usize, _way: usize) {}

    /// Advances the pointer past `way` when it was the oldest line.
    fn insert(&mut self, set: usize, way: usize) {
        if self.next_way[set] == way {
            self.next_way[set] = (way + 1) % self.ways;
        }
    }

    fn victim(&self, set: usize) -> usize {
        self.next_way[set]
    }
}
