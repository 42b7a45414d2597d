//! Cache unit tests.



/// Replacement policy victim selection.
pub mod policies;
