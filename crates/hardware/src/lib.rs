//! Cache hierarchy and hardware prefetch simulator library.
//!
//! This crate implements a cycle-level model of a cache hierarchy with the following:
//! 1. **Prefetch:** A per-level dispatcher with next-line, adaptive stream-length,
//!    and global history buffer engines sharing one admission path.
//! 2. **Caches:** Set-associative levels with outstanding-miss tables, retry lists,
//!    and completion lists.
//! 3. **Simulation:** A clocked hierarchy, trace parsing, configuration, and
//!    statistics collection.

/// Common types (requests, cache levels, errors).
pub mod common;
/// Simulator configuration (defaults, enums, per-level cache structures).
pub mod config;
/// Hardware units (caches and prefetchers).
pub mod core;
/// Clocked hierarchy and trace loading.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Memory request flowing between cache levels.
pub use crate::common::{CacheLevel, Request, RequestType};
/// Top-level hierarchy; construct with `MemoryHierarchy::new`.
pub use crate::sim::MemoryHierarchy;
