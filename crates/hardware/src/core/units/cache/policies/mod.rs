//! Cache Replacement Policies.
//!
//! Implements the algorithms used to select victim lines in set-associative caches.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out.
//! - `Lru`: Least Recently Used.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

/// Trait for cache replacement policies.
///
/// Hits and fills are reported separately so that insertion-ordered policies
/// are not disturbed by reuse.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Records a hit on `way` of `set`.
    fn touch(&mut self, set: usize, way: usize);

    /// Records that a new line was installed in `way` of `set`.
    fn insert(&mut self, set: usize, way: usize);

    /// Selects the preferred victim way of `set`.
    fn victim(&self, set: usize) -> usize;
}
