//! Configuration system for the cache hierarchy simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline cache geometry, MSHR, and prefetcher constants.
//! 2. **Structures:** Hierarchical config for the cache levels.
//! 3. **Enums:** Replacement policy and prefetcher types.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built from
//! `Config::default()`. It is fixed once a hierarchy has been constructed.

use serde::{Deserialize, Serialize};

use crate::common::CacheLevel;
use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
mod defaults {
    /// Default cache size in bytes (32 KiB).
    pub const CACHE_SIZE: usize = 32 * 1024;

    /// Default cache line size in bytes (64 bytes).
    ///
    /// Matches typical modern processor cache line sizes and DRAM burst length.
    pub const CACHE_LINE: usize = 64;

    /// Default cache associativity.
    pub const CACHE_WAYS: usize = 8;

    /// Default cache access latency in cycles.
    pub const CACHE_LATENCY: u64 = 4;

    /// Default number of outstanding-miss (MSHR) entries per level.
    pub const MSHR_ENTRIES: usize = 16;

    /// Default adaptive-stream epoch length, in observed reads.
    pub const STREAM_EPOCH_SIZE: usize = 100;

    /// Default longest stream stride tracked by the stream-length histogram.
    pub const STREAM_MAX_LENGTH: usize = 16;

    /// Default global history buffer capacity.
    pub const HISTORY_BUFFER_SIZE: usize = 64;

    /// Default global history index table capacity.
    pub const INDEX_TABLE_SIZE: usize = 8;
}

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which cache line to evict
/// when a new line must be installed in a full cache set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used replacement policy.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// First In First Out replacement policy (round-robin per set).
    #[serde(alias = "Fifo")]
    Fifo,
}

/// Hardware prefetcher types.
///
/// Each cache level selects exactly one engine at construction; it never
/// changes during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Prefetcher {
    /// No prefetching enabled.
    #[default]
    None,
    /// Next-line prefetcher.
    ///
    /// Prefetches the next sequential cache line after each read.
    NextLine,
    /// Adaptive stream-length prefetcher.
    ///
    /// Derives a fetch depth from a histogram of observed stream strides.
    /// Only applies to the L3 cache.
    #[serde(alias = "ASD")]
    AdaptiveStream,
    /// Global history buffer (Markov) prefetcher.
    ///
    /// Predicts successors of an address from previously observed sequences.
    /// Applies to the L2 and L3 caches.
    #[serde(alias = "Markov")]
    GlobalHistory,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use pfsim_core::config::Config;
///
/// let config = Config::default();
/// assert!(config.cache.l1.enabled);
/// assert_eq!(config.cache.l1.line_bytes, 64);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use pfsim_core::config::{Config, Prefetcher};
///
/// let json = r#"{
///     "cache": {
///         "l1": { "enabled": true, "size_bytes": 32768, "ways": 8, "latency": 4,
///                 "prefetcher": "NextLine" },
///         "l2": { "enabled": true, "size_bytes": 262144, "ways": 8, "latency": 12,
///                 "prefetcher": "GlobalHistory", "history_buffer_size": 128 },
///         "l3": { "enabled": true, "size_bytes": 2097152, "ways": 16, "latency": 40,
///                 "prefetcher": "AdaptiveStream", "stream_epoch_size": 50 }
///     }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cache.l2.prefetcher, Prefetcher::GlobalHistory);
/// assert_eq!(config.cache.l2.history_buffer_size, 128);
/// assert_eq!(config.cache.l3.stream_epoch_size, 50);
/// assert_eq!(config.cache.l3.stream_max_length, 16);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache hierarchy configuration
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
}

impl Config {
    /// Decodes and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Json`](crate::common::SimError::Json) for malformed
    /// JSON and [`SimError::Config`](crate::common::SimError::Config) for values
    /// rejected by [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, crate::common::SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every enabled level.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, [`ConfigError::NoLevels`]
    /// when every level is disabled, or [`ConfigError::LineSizeMismatch`] when
    /// enabled levels use different line sizes. Fills and miss-table entries
    /// are keyed by line, so every level must share one line size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let enabled: Vec<_> = CacheLevel::ALL
            .into_iter()
            .filter(|&level| self.cache.level(level).enabled)
            .collect();
        let Some(&first) = enabled.first() else {
            return Err(ConfigError::NoLevels);
        };
        let expected = self.cache.level(first).line_bytes;
        for level in enabled {
            let config = self.cache.level(level);
            config.validate(level.name())?;
            if config.line_bytes != expected {
                return Err(ConfigError::LineSizeMismatch {
                    level: level.name(),
                    first: first.name(),
                    expected,
                    value: config.line_bytes,
                });
            }
        }
        Ok(())
    }
}

/// Cache hierarchy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHierarchyConfig {
    /// First-level cache
    #[serde(default = "CacheHierarchyConfig::default_l1")]
    pub l1: CacheConfig,
    /// Second-level cache
    #[serde(default)]
    pub l2: CacheConfig,
    /// Third-level cache
    #[serde(default)]
    pub l3: CacheConfig,
}

impl CacheHierarchyConfig {
    /// Configuration of `level`.
    pub const fn level(&self, level: CacheLevel) -> &CacheConfig {
        match level {
            CacheLevel::L1 => &self.l1,
            CacheLevel::L2 => &self.l2,
            CacheLevel::L3 => &self.l3,
        }
    }

    /// L1 is the only level enabled out of the box.
    fn default_l1() -> CacheConfig {
        CacheConfig {
            enabled: true,
            ..CacheConfig::default()
        }
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            l1: Self::default_l1(),
            l2: CacheConfig::default(),
            l3: CacheConfig::default(),
        }
    }
}

/// Individual cache level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable this cache level
    #[serde(default)]
    pub enabled: bool,

    /// Total cache size in bytes
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Cache line size in bytes
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Associativity (number of ways)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Access latency in cycles
    #[serde(default = "CacheConfig::default_latency")]
    pub latency: u64,

    /// Replacement policy
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Outstanding-miss table capacity
    #[serde(default = "CacheConfig::default_mshr_entries")]
    pub mshr_entries: usize,

    /// Hardware prefetcher type
    #[serde(default)]
    pub prefetcher: Prefetcher,

    /// Reads per histogram publication (adaptive stream prefetcher)
    #[serde(default = "CacheConfig::default_stream_epoch_size")]
    pub stream_epoch_size: usize,

    /// Number of histogram bins (adaptive stream prefetcher)
    #[serde(default = "CacheConfig::default_stream_max_length")]
    pub stream_max_length: usize,

    /// History buffer capacity (global history prefetcher)
    #[serde(default = "CacheConfig::default_history_buffer_size")]
    pub history_buffer_size: usize,

    /// Index table capacity (global history prefetcher)
    #[serde(default = "CacheConfig::default_index_table_size")]
    pub index_table_size: usize,
}

impl CacheConfig {
    /// Returns the default cache size in bytes.
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    /// Returns the default cache line size in bytes.
    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    /// Returns the default cache associativity (number of ways).
    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    /// Returns the default cache access latency in cycles.
    fn default_latency() -> u64 {
        defaults::CACHE_LATENCY
    }

    /// Returns the default MSHR capacity.
    fn default_mshr_entries() -> usize {
        defaults::MSHR_ENTRIES
    }

    fn default_stream_epoch_size() -> usize {
        defaults::STREAM_EPOCH_SIZE
    }

    fn default_stream_max_length() -> usize {
        defaults::STREAM_MAX_LENGTH
    }

    fn default_history_buffer_size() -> usize {
        defaults::HISTORY_BUFFER_SIZE
    }

    fn default_index_table_size() -> usize {
        defaults::INDEX_TABLE_SIZE
    }

    /// Number of sets implied by size, line size, and associativity.
    ///
    /// Only meaningful for a configuration that passed [`CacheConfig::validate`].
    pub const fn num_sets(&self) -> usize {
        self.size_bytes / (self.line_bytes * self.ways)
    }

    /// Checks geometry and prefetcher parameters.
    ///
    /// # Arguments
    ///
    /// * `level` - Level name used in error messages.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self, level: &'static str) -> Result<(), ConfigError> {
        let nonzero = |field, value: usize| {
            if value == 0 {
                Err(ConfigError::Zero { level, field })
            } else {
                Ok(())
            }
        };

        nonzero("line_bytes", self.line_bytes)?;
        if !self.line_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                level,
                field: "line_bytes",
                value: self.line_bytes,
            });
        }
        nonzero("ways", self.ways)?;
        nonzero("size_bytes", self.size_bytes)?;
        let set_bytes = self.line_bytes * self.ways;
        if self.size_bytes % set_bytes != 0 {
            return Err(ConfigError::Geometry {
                level,
                size_bytes: self.size_bytes,
                set_bytes,
            });
        }
        nonzero("mshr_entries", self.mshr_entries)?;

        match self.prefetcher {
            Prefetcher::AdaptiveStream => {
                nonzero("stream_epoch_size", self.stream_epoch_size)?;
                if self.stream_max_length < 2 {
                    return Err(ConfigError::TooSmall {
                        level,
                        field: "stream_max_length",
                        min: 2,
                        value: self.stream_max_length,
                    });
                }
            }
            Prefetcher::GlobalHistory => {
                nonzero("history_buffer_size", self.history_buffer_size)?;
                nonzero("index_table_size", self.index_table_size)?;
            }
            Prefetcher::None | Prefetcher::NextLine => {}
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    /// Creates a default cache configuration.
    ///
    /// The level is disabled, uses LRU replacement and no prefetching; all
    /// prefetcher tunables carry their defaults so switching the engine on
    /// needs no further fields.
    fn default() -> Self {
        Self {
            enabled: false,
            size_bytes: defaults::CACHE_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS,
            latency: defaults::CACHE_LATENCY,
            policy: ReplacementPolicy::default(),
            mshr_entries: defaults::MSHR_ENTRIES,
            prefetcher: Prefetcher::default(),
            stream_epoch_size: defaults::STREAM_EPOCH_SIZE,
            stream_max_length: defaults::STREAM_MAX_LENGTH,
            history_buffer_size: defaults::HISTORY_BUFFER_SIZE,
            index_table_size: defaults::INDEX_TABLE_SIZE,
        }
    }
}
