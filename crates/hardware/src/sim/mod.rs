//! Trace-driven simulation.
//!
//! Provides the clocked cache hierarchy and the parser for the access traces
//! replayed through it.

/// Clocked chain of cache levels.
pub mod hierarchy;

/// Text access-trace parser.
pub mod trace;

pub use self::hierarchy::MemoryHierarchy;
