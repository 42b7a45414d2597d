//! Next-Line Prefetcher.
//!
//! A stateless spatial prefetcher that predicts the block immediately following
//! every read. It is the baseline engine and applies to every cache level.

/// Next-Line Prefetcher state.
#[derive(Debug, Clone, Copy)]
pub struct NextLinePrefetcher {
    /// Size of a cache line in bytes.
    line_bytes: u64,
}

impl NextLinePrefetcher {
    /// Creates a new Next-Line prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes, inherited from the cache.
    pub const fn new(line_bytes: u64) -> Self {
        Self { line_bytes }
    }

    /// Predicts the address one block past `addr`.
    #[inline]
    pub const fn predict(&self, addr: u64) -> u64 {
        addr.wrapping_add(self.line_bytes)
    }
}
