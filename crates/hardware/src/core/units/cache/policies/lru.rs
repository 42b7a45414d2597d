//! Least Recently Used (LRU) Replacement Policy.
//!
//! Every way carries the tick of its last use; the victim is the way with the
//! oldest tick. Ways that were never used keep tick zero and are chosen first,
//! lowest way number winning ties.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `touch()` / `insert()`: O(1)
//!   - `victim()`: O(W) where W is the number of ways
//! - **Space Complexity:** O(S × W) where S is the number of sets

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// Last-use tick per line, laid out set-major.
    stamps: Vec<u64>,
    ways: usize,
    tick: u64,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        let ways = ways.max(1);
        Self {
            stamps: vec![0; sets * ways],
            ways,
            tick: 0,
        }
    }

    fn stamp(&mut self, set: usize, way: usize) {
        self.tick += 1;
        self.stamps[set * self.ways + way] = self.tick;
    }
}

impl ReplacementPolicy for LruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        self.stamp(set, way);
    }

    fn insert(&mut self, set: usize, way: usize) {
        self.stamp(set, way);
    }

    fn victim(&self, set: usize) -> usize {
        let base = set * self.ways;
        self.stamps[base..base + self.ways]
            .iter()
            .enumerate()
            .min_by_key(|&(_, stamp)| *stamp)
            .map_or(0, |(way, _)| way)
    }
}
