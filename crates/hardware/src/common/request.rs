//! Memory Request Types.
//!
//! This module defines the request value that flows through the cache hierarchy.
//! Requests are used for the following:
//! 1. **Demand Traffic:** Reads and writes issued by a core into the top cache level.
//! 2. **Speculative Traffic:** Prefetches built by a level's prefetch unit.
//! 3. **Scheduling:** Priority, distance, and timestamps consumed by downstream levels.

use serde::{Deserialize, Serialize};

/// Type of memory request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Data read. The only type a prefetch is ever derived from.
    Read,

    /// Data write. Marks the target line dirty on allocation or hit.
    Write,
}

/// Identity of a cache level in the hierarchy.
///
/// Prefetch engines use this to decide whether they apply to the level that
/// owns them (see [`PrefetchUnit::exists_for_level`]).
///
/// [`PrefetchUnit::exists_for_level`]: crate::core::units::prefetch::PrefetchUnit::exists_for_level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheLevel {
    /// First-level cache, closest to the core.
    L1,
    /// Second-level cache.
    L2,
    /// Third-level cache (last level when enabled).
    L3,
}

impl CacheLevel {
    /// Every level, top first.
    pub const ALL: [Self; 3] = [Self::L1, Self::L2, Self::L3];

    /// Short display name used in statistics output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }
}

/// A memory request travelling through the hierarchy.
///
/// The address and type are fixed at construction; the scheduling fields
/// (`priority`, `is_prefetch`, `distance`, timestamps) are filled in by
/// whichever component builds or forwards the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Byte address of the access.
    pub addr: u64,
    /// Read or write.
    pub req_type: RequestType,
    /// Core that issued the demand access this request descends from.
    pub core_id: usize,
    /// True when the request was built by a prefetcher.
    pub is_prefetch: bool,
    /// Scheduling priority; higher is more urgent.
    pub priority: u8,
    /// Offset from the demand read that triggered a prefetch, in cache lines
    /// (not bytes): `candidate / line_bytes - trigger / line_bytes`. Negative
    /// when the candidate lies below the trigger; 0 for demand requests.
    pub distance: i64,
    /// Cycle the request entered its current level.
    pub arrive: u64,
    /// Cycle the request completed, once known.
    pub depart: Option<u64>,
}

impl Request {
    /// Creates a demand request.
    ///
    /// # Arguments
    ///
    /// * `addr` - Byte address of the access.
    /// * `req_type` - Read or write.
    /// * `core_id` - Issuing core.
    pub const fn new(addr: u64, req_type: RequestType, core_id: usize) -> Self {
        Self {
            addr,
            req_type,
            core_id,
            is_prefetch: false,
            priority: 0,
            distance: 0,
            arrive: 0,
            depart: None,
        }
    }

    /// Shorthand for a demand read from core 0.
    pub const fn read(addr: u64) -> Self {
        Self::new(addr, RequestType::Read, 0)
    }

    /// Shorthand for a demand write from core 0.
    pub const fn write(addr: u64) -> Self {
        Self::new(addr, RequestType::Write, 0)
    }

    /// Returns true for read requests.
    #[inline]
    pub fn is_read(&self) -> bool {
        self.req_type == RequestType::Read
    }
}
