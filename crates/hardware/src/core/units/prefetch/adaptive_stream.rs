//! Adaptive Stream-Length Prefetcher.
//!
//! Keeps a Stream-Length Histogram (SLH) of how often each stride, measured in
//! cache lines, is repeated by consecutive reads. The histogram is double
//! buffered: [`build_new_slh`](AdaptiveStreamPrefetcher::build_new_slh) only
//! writes the *build* generation, [`stream_filter`](AdaptiveStreamPrefetcher::stream_filter)
//! only reads the *published* one, and the build generation is copied over the
//! published one once per epoch. Publishing on a fixed period keeps transient
//! bursts from thrashing the prediction.
//!
//! The fetch depth is the shortest length for which a stream is more likely to
//! continue than to stop:
//!
//! ```text
//! P(i)      = h[i] / total
//! P_tail(i) = sum(h[j] for j > i) / total
//! depth     = first i with P(i) < P_tail(i), plus one
//! ```
//!
//! The engine only applies to the last-level cache.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `build_new_slh()`: O(1)
//!   - `stream_filter()`: O(F) where F is the number of histogram bins
//! - **Space Complexity:** O(F)

use tracing::trace;

/// Adaptive stream-length prefetcher state.
#[derive(Debug, Clone)]
pub struct AdaptiveStreamPrefetcher {
    /// Size of a cache line in bytes.
    line_bytes: u64,
    /// Reads per publication.
    epoch_size: usize,
    /// Reads observed in the current epoch.
    epoch: usize,
    /// Histogram read by the prediction step.
    published: Vec<u64>,
    /// Histogram written by the update step.
    build: Vec<u64>,
    /// Address of the previous read.
    prev_addr: Option<u64>,
    /// Stride of the run in progress, in lines.
    prev_bin: Option<usize>,
    /// Reads observed since construction.
    total_reads: u64,
}

impl AdaptiveStreamPrefetcher {
    /// Creates a new adaptive stream-length prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `epoch_size` - Reads between histogram publications.
    /// * `max_stream_length` - Number of histogram bins; longer strides are ignored.
    pub fn new(line_bytes: u64, epoch_size: usize, max_stream_length: usize) -> Self {
        Self {
            line_bytes: line_bytes.max(1),
            epoch_size: epoch_size.max(1),
            epoch: 0,
            published: vec![0; max_stream_length],
            build: vec![0; max_stream_length],
            prev_addr: None,
            prev_bin: None,
            total_reads: 0,
        }
    }

    /// Observes a read and returns the fetch depth in cache lines.
    ///
    /// Updates the build histogram, advances the epoch (publishing when it
    /// completes), then predicts from the published histogram. A depth of zero
    /// means no prefetch.
    pub fn observe(&mut self, addr: u64) -> u64 {
        self.build_new_slh(addr);

        self.epoch += 1;
        if self.epoch >= self.epoch_size {
            self.published.copy_from_slice(&self.build);
            self.epoch = 0;
            trace!(total_reads = self.total_reads, "stream-length histogram published");
        }

        self.stream_filter()
    }

    /// Folds one read into the build histogram.
    ///
    /// A read below the previous address is not counted. Otherwise the stride in
    /// lines is compared with the stride of the run in progress: a repeat bumps
    /// that stride's bin, anything else starts a new run. Strides outside the
    /// histogram break the run without being counted.
    pub fn build_new_slh(&mut self, addr: u64) {
        self.total_reads += 1;
        let prev = self.prev_addr.replace(addr);

        let Some(prev) = prev else {
            return;
        };
        if addr < prev {
            return;
        }

        let bin = (addr / self.line_bytes - prev / self.line_bytes) as usize;
        if bin >= self.build.len() {
            self.prev_bin = None;
            return;
        }

        if self.prev_bin == Some(bin) {
            self.build[bin] += 1;
        } else {
            self.prev_bin = Some(bin);
        }
    }

    /// Derives the fetch depth from the published histogram.
    ///
    /// Returns `i + 1` for the first bin `i` whose probability is below the
    /// combined probability of all longer bins, or zero when no bin qualifies.
    pub fn stream_filter(&self) -> u64 {
        if self.total_reads == 0 {
            return 0;
        }
        let total = self.total_reads as f64;
        let mut tail: u64 = self.published.iter().sum();

        for (i, &count) in self.published.iter().enumerate() {
            tail -= count;
            let p = count as f64 / total;
            let p_tail = tail as f64 / total;
            if p < p_tail {
                return i as u64 + 1;
            }
        }
        0
    }

    /// Published histogram generation.
    pub fn published(&self) -> &[u64] {
        &self.published
    }

    /// Build histogram generation.
    pub fn building(&self) -> &[u64] {
        &self.build
    }

    /// Reads observed since construction.
    pub const fn total_reads(&self) -> u64 {
        self.total_reads
    }

    /// Reads observed in the current epoch.
    pub const fn epoch_position(&self) -> usize {
        self.epoch
    }
}
