//! Error definitions.
//!
//! This module defines the errors the simulator can report. It provides:
//! 1. **Configuration Errors:** Rejected cache or prefetcher parameters.
//! 2. **Trace Errors:** Malformed lines in an access trace.
//! 3. **Simulation Errors:** An umbrella type for front ends that load both.
//!
//! Prefetch admission outcomes (folded, dropped, zero-depth) are not errors;
//! they are reported as [`AdmitOutcome`](crate::core::units::prefetch::AdmitOutcome) values.

use thiserror::Error;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field that must be non-zero was zero.
    #[error("{level}: `{field}` must be non-zero")]
    Zero {
        /// Cache level the field belongs to.
        level: &'static str,
        /// Offending field name.
        field: &'static str,
    },

    /// A field that must be a power of two was not.
    #[error("{level}: `{field}` must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Cache level the field belongs to.
        level: &'static str,
        /// Offending field name.
        field: &'static str,
        /// Value supplied.
        value: usize,
    },

    /// The cache size does not divide into whole sets.
    #[error("{level}: size {size_bytes} is not a multiple of line_bytes * ways ({set_bytes})")]
    Geometry {
        /// Cache level.
        level: &'static str,
        /// Configured size in bytes.
        size_bytes: usize,
        /// Bytes per set.
        set_bytes: usize,
    },

    /// A field is below its minimum.
    #[error("{level}: `{field}` must be at least {min}, got {value}")]
    TooSmall {
        /// Cache level the field belongs to.
        level: &'static str,
        /// Offending field name.
        field: &'static str,
        /// Minimum accepted value.
        min: usize,
        /// Value supplied.
        value: usize,
    },

    /// Enabled levels disagree on the line size.
    #[error("{level}: line_bytes {value} differs from {first}'s {expected}")]
    LineSizeMismatch {
        /// Level whose line size differs.
        level: &'static str,
        /// Topmost enabled level, which sets the line size.
        first: &'static str,
        /// Line size of the topmost enabled level.
        expected: usize,
        /// Line size supplied.
        value: usize,
    },

    /// No cache level is enabled.
    #[error("at least one cache level must be enabled")]
    NoLevels,
}

/// Malformed access trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A line could not be parsed.
    #[error("line {line}: {reason}: `{content}`")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Raw line content.
        content: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The trace could not be read.
    #[error("trace I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for simulation front ends.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Configuration JSON could not be decoded.
    #[error("configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Trace could not be loaded.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Any other I/O failure.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}
