//! Hardware Prefetcher implementations.
//!
//! This module contains the prefetch unit owned by each cache level and the
//! prediction engines it can run. It provides:
//! 1. **Dispatch:** [`PrefetchUnit`] selects the configured engine and forwards
//!    every observed read to it.
//! 2. **Admission:** A single path ([`PrefetchUnit::admit`]) applies the duplicate,
//!    capacity, and allocation checks, builds the speculative request, assigns its
//!    priority, and hands it downstream.
//! 3. **Engines:** Next-line, adaptive stream-length, and global history buffer.
//!
//! The unit never owns cache state. It reaches the outstanding-miss table, the line
//! allocator, and the downstream queues through the [`PrefetchHost`] trait
//! implemented by the owning cache level.

/// Adaptive stream-length prefetcher (stream-length histogram).
pub mod adaptive_stream;

/// Global history buffer (Markov) prefetcher.
pub mod global_history;

/// Next-line prefetcher (prefetches the following cache line).
pub mod next_line;

pub use self::adaptive_stream::AdaptiveStreamPrefetcher;
pub use self::global_history::GlobalHistoryPrefetcher;
pub use self::next_line::NextLinePrefetcher;

use tracing::debug;

use crate::common::{CacheLevel, Request, RequestType};
use crate::config::{CacheConfig, Prefetcher as PrefetcherType};
use crate::core::units::cache::LineHandle;

/// The narrow view of a cache level a prefetch unit is allowed to touch.
///
/// Implemented by the owning cache level. All methods complete synchronously;
/// the simulator is single-threaded at this granularity, so a capacity check
/// followed by a registration cannot be interleaved with another caller.
pub trait PrefetchHost {
    /// Current simulated cycle.
    fn clock(&self) -> u64;

    /// Access latency of the owning level in cycles.
    fn latency(&self) -> u64;

    /// True when no cache level sits below the owning level.
    fn is_last_level(&self) -> bool;

    /// True when the line holding `addr` is already valid in the cache.
    fn is_resident(&self, addr: u64) -> bool;

    /// True when a miss for the line holding `addr` is already outstanding.
    fn mshr_contains(&self, addr: u64) -> bool;

    /// True when the outstanding-miss table has no free entry.
    fn mshr_is_full(&self) -> bool;

    /// Reserves a clean line for `addr` in its set.
    ///
    /// Returns `None` when no way in the set can be replaced.
    fn allocate_line(&mut self, addr: u64) -> Option<LineHandle>;

    /// Registers an outstanding miss for `addr` filling `line`.
    fn register_miss(&mut self, addr: u64, line: LineHandle, prefetch: bool);

    /// Offers `req` to the next lower level.
    ///
    /// # Errors
    ///
    /// Hands the request back when the lower level declines it this cycle.
    fn submit_lower(&mut self, req: Request) -> Result<(), Request>;

    /// Parks a request the lower level declined; the owning level re-offers it on
    /// later cycles.
    fn push_retry(&mut self, req: Request);

    /// Schedules `req` to complete at cycle `at`.
    fn enqueue_completion(&mut self, at: u64, req: Request);
}

/// Result of offering one candidate address to [`PrefetchUnit::admit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Candidate equals the triggering address; nothing built.
    ZeroDepth,
    /// Line is already valid in the cache; nothing built.
    Resident,
    /// A miss for the line is already pending; folded into it.
    Folded,
    /// Outstanding-miss table is full; prefetch abandoned.
    DroppedFull,
    /// No replaceable line in the target set; prefetch abandoned.
    DroppedNoLine,
    /// Accepted by the next lower level.
    Forwarded,
    /// Lower level declined; parked on the owning level's retry list.
    Deferred,
    /// Last level; scheduled on the completion list.
    Queued,
}

impl AdmitOutcome {
    /// True when a speculative request was built and handed on.
    pub const fn is_issued(self) -> bool {
        matches!(self, Self::Forwarded | Self::Deferred | Self::Queued)
    }
}

/// Counters for every admission outcome of one prefetch unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// Prefetches built and handed downstream (including deferred ones).
    pub issued: u64,
    /// Prefetches that went onto the retry list.
    pub deferred: u64,
    /// Candidates folded into an already pending miss.
    pub folded: u64,
    /// Candidates dropped because the miss table was full.
    pub dropped_full: u64,
    /// Candidates dropped because no line could be allocated.
    pub dropped_no_line: u64,
    /// Candidates whose line was already resident.
    pub resident: u64,
    /// Predictions equal to the triggering address.
    pub zero_depth: u64,
}

impl PrefetchStats {
    /// Tallies one admission outcome.
    pub const fn record(&mut self, outcome: AdmitOutcome) {
        match outcome {
            AdmitOutcome::ZeroDepth => self.zero_depth += 1,
            AdmitOutcome::Resident => self.resident += 1,
            AdmitOutcome::Folded => self.folded += 1,
            AdmitOutcome::DroppedFull => self.dropped_full += 1,
            AdmitOutcome::DroppedNoLine => self.dropped_no_line += 1,
            AdmitOutcome::Forwarded | AdmitOutcome::Queued => self.issued += 1,
            AdmitOutcome::Deferred => {
                self.issued += 1;
                self.deferred += 1;
            }
        }
    }
}

/// Maps a prefetch distance (in cache lines) to a scheduling priority.
///
/// Closer lines are consumed sooner and are scheduled more urgently:
/// `[0,4) -> 4`, `[4,8) -> 3`, `[8,12) -> 2`, `[12,16) -> 1`, anything else `-> 0`.
pub const fn priority_for_distance(distance: i64) -> u8 {
    match distance {
        0..=3 => 4,
        4..=7 => 3,
        8..=11 => 2,
        12..=15 => 1,
        _ => 0,
    }
}

/// The active prediction engine of a prefetch unit.
#[derive(Debug)]
pub enum Engine {
    /// Next-line engine.
    NextLine(NextLinePrefetcher),
    /// Adaptive stream-length engine.
    AdaptiveStream(AdaptiveStreamPrefetcher),
    /// Global history buffer engine.
    GlobalHistory(GlobalHistoryPrefetcher),
}

impl Engine {
    /// Reports whether the engine is meaningful at `level`.
    pub const fn applies_to(&self, level: CacheLevel) -> bool {
        match self {
            Self::NextLine(_) => true,
            Self::AdaptiveStream(_) => matches!(level, CacheLevel::L3),
            Self::GlobalHistory(_) => matches!(level, CacheLevel::L2 | CacheLevel::L3),
        }
    }
}

/// Per-level prefetch dispatcher.
///
/// Holds the engine selected at construction and funnels every prediction
/// through [`PrefetchUnit::admit`].
#[derive(Debug)]
pub struct PrefetchUnit {
    level: CacheLevel,
    line_bytes: u64,
    engine: Option<Engine>,
    candidates: Vec<u64>,
    /// Admission outcome counters.
    pub stats: PrefetchStats,
}

impl PrefetchUnit {
    /// Creates the prefetch unit for a cache level.
    ///
    /// # Arguments
    ///
    /// * `level` - Identity of the owning cache level.
    /// * `config` - The level's configuration (engine type, line size, tunables).
    pub fn new(level: CacheLevel, config: &CacheConfig) -> Self {
        let line_bytes = config.line_bytes as u64;
        let engine = match config.prefetcher {
            PrefetcherType::None => None,
            PrefetcherType::NextLine => Some(Engine::NextLine(NextLinePrefetcher::new(line_bytes))),
            PrefetcherType::AdaptiveStream => {
                Some(Engine::AdaptiveStream(AdaptiveStreamPrefetcher::new(
                    line_bytes,
                    config.stream_epoch_size,
                    config.stream_max_length,
                )))
            }
            PrefetcherType::GlobalHistory => {
                Some(Engine::GlobalHistory(GlobalHistoryPrefetcher::new(
                    config.history_buffer_size,
                    config.index_table_size,
                )))
            }
        };

        Self {
            level,
            line_bytes,
            engine,
            candidates: Vec::new(),
            stats: PrefetchStats::default(),
        }
    }

    /// Level this unit belongs to.
    pub const fn level(&self) -> CacheLevel {
        self.level
    }

    /// The configured engine, if any.
    pub const fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    /// Whether the configured engine applies to the owning level.
    ///
    /// The owning cache skips [`PrefetchUnit::activate`] entirely when false.
    pub fn exists_for_level(&self) -> bool {
        self.engine
            .as_ref()
            .is_some_and(|engine| engine.applies_to(self.level))
    }

    /// Runs the configured engine on an observed read and admits its predictions.
    ///
    /// # Panics
    ///
    /// Panics if `req` is not a read; only reads may trigger a prefetch.
    pub fn activate<H: PrefetchHost>(&mut self, req: &Request, host: &mut H) {
        assert!(
            req.is_read(),
            "{:?} prefetcher activated by a {:?} request at {:#x}",
            self.level,
            req.req_type,
            req.addr
        );

        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        match &mut self.engine {
            None => {}
            Some(Engine::NextLine(engine)) => candidates.push(engine.predict(req.addr)),
            Some(Engine::AdaptiveStream(engine)) => {
                let depth = engine.observe(req.addr);
                candidates.push(req.addr.wrapping_add(depth * self.line_bytes));
            }
            Some(Engine::GlobalHistory(engine)) => engine.observe(req.addr, &mut candidates),
        }

        for &candidate in &candidates {
            let _ = self.admit(candidate, req, host);
        }
        self.candidates = candidates;
    }

    /// Offers a candidate address for prefetching.
    ///
    /// Applies, in order: the zero-depth rule, the residency check, duplicate
    /// folding against the outstanding-miss table, the table capacity check, and
    /// line allocation. Only then is the speculative request built and handed to
    /// the next level (or the completion list at the last level). A rejected
    /// candidate leaves cache and table state untouched.
    ///
    /// # Arguments
    ///
    /// * `candidate` - Predicted byte address.
    /// * `trigger` - The demand read that produced the prediction.
    /// * `host` - The owning cache level.
    ///
    /// # Panics
    ///
    /// Panics if `trigger` is not a read.
    pub fn admit<H: PrefetchHost>(
        &mut self,
        candidate: u64,
        trigger: &Request,
        host: &mut H,
    ) -> AdmitOutcome {
        assert!(trigger.is_read(), "prefetch derived from a non-read request");
        let outcome = self.try_admit(candidate, trigger, host);
        self.stats.record(outcome);
        outcome
    }

    fn try_admit<H: PrefetchHost>(
        &self,
        candidate: u64,
        trigger: &Request,
        host: &mut H,
    ) -> AdmitOutcome {
        if candidate == trigger.addr {
            return AdmitOutcome::ZeroDepth;
        }
        if host.is_resident(candidate) {
            return AdmitOutcome::Resident;
        }
        if host.mshr_contains(candidate) {
            debug!(level = ?self.level, addr = candidate, "prefetch folded into pending miss");
            return AdmitOutcome::Folded;
        }
        if host.mshr_is_full() {
            debug!(level = ?self.level, addr = candidate, "prefetch dropped: miss table full");
            return AdmitOutcome::DroppedFull;
        }
        let Some(line) = host.allocate_line(candidate) else {
            debug!(level = ?self.level, addr = candidate, "prefetch dropped: no replaceable line");
            return AdmitOutcome::DroppedNoLine;
        };
        host.register_miss(candidate, line, true);

        let distance = self.line_distance(candidate, trigger.addr);
        let req = Request {
            addr: candidate,
            req_type: RequestType::Read,
            core_id: trigger.core_id,
            is_prefetch: true,
            priority: priority_for_distance(distance),
            distance,
            arrive: host.clock(),
            depart: None,
        };

        if host.is_last_level() {
            let at = host.clock() + host.latency();
            host.enqueue_completion(at, req);
            return AdmitOutcome::Queued;
        }
        match host.submit_lower(req) {
            Ok(()) => AdmitOutcome::Forwarded,
            Err(req) => {
                debug!(level = ?self.level, addr = req.addr, "prefetch deferred to retry list");
                host.push_retry(req);
                AdmitOutcome::Deferred
            }
        }
    }

    /// Signed distance from `trigger` to `candidate` in whole cache lines.
    ///
    /// Wraps like the candidate arithmetic, so neighbouring lines either side
    /// of `i64::MAX` are still one line apart.
    fn line_distance(&self, candidate: u64, trigger: u64) -> i64 {
        let lines = |addr: u64| (addr / self.line_bytes) as i64;
        lines(candidate).wrapping_sub(lines(trigger))
    }
}
