//! Hardware units of the memory system.
//!
//! This module contains the cache levels and the prefetch units they own.

/// Cache levels and prefetchers.
pub mod units;
