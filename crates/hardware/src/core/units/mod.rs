//! Memory-system functional units.
//!
//! This module contains the set-associative cache level with its miss handling
//! and the hardware prefetchers that run beside it.

/// Cache level implementation with outstanding-miss table and replacement policies.
pub mod cache;

/// Hardware prefetcher implementations (next-line, adaptive stream-length, global history).
pub mod prefetch;
