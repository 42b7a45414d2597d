//! # Unit Components
//!
//! This module serves as the central hub for the per-module tests of the
//! simulator library, mirroring its source layout.
