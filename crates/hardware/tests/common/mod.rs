//! Shared test infrastructure.


use pfsim_core::config::{CacheConfig, Prefetcher, ReplacementPolicy};

/// Line size used by every helper configuration.
pub const LINE: u64 = 64;

/// Creates a small, deterministic test cache.
///
/// 256 bytes, 64-byte lines, 2-way set-associative, LRU, 1-cycle latency,
/// eight miss-table entries, enabled.
///
/// With these parameters:
///   - num_sets = 256 / (64 * 2) = 2
///   - set index = (addr / 64) % 2
///
/// Prefetcher tunables are kept small so tests reach epoch boundaries and
/// buffer wrap-around quickly.
pub fn small_cache(prefetcher: Prefetcher) -> CacheConfig {
    CacheConfig {
        enabled: true,
        size_bytes: 256,
        line_bytes: LINE as usize,
        ways: 2,
        latency: 1,
        policy: ReplacementPolicy::Lru,
        mshr_entries: 8,
        prefetcher,
        stream_epoch_size: 4,
        stream_max_length: 16,
        history_buffer_size: 8,
        index_table_size: 4,
    }
}

/// Creates a roomy cache that never runs out of lines in tests.
pub fn large_cache(prefetcher: Prefetcher, latency: u64) -> CacheConfig {
    CacheConfig {
        size_bytes: 64 * 1024,
        ways: 8,
        latency,
        mshr_entries: 16,
        ..small_cache(prefetcher)
    }
}

/// Routes library logging to the test writer; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
