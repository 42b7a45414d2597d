//! Common types shared across the simulator.
//!
//! This module provides the building blocks every other component depends on:
//! 1. **Requests:** The request value, its type, and cache level identity.
//! 2. **Error Handling:** Configuration, trace, and front-end error types.

/// Error types (configuration, trace, simulation).
pub mod error;

/// Memory request definitions.
pub mod request;

pub use error::{ConfigError, SimError, TraceError};
pub use request::{CacheLevel, Request, RequestType};
