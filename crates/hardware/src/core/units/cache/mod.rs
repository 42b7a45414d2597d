//! Set-Associative Cache Level.
//!
//! This module implements one level of the simulated cache hierarchy. It provides:
//! 1. **Line Storage:** Tags with valid, dirty, and pending-fill bits, plus a
//!    replacement policy.
//! 2. **Miss Handling:** An outstanding-miss table, a retry list for requests the
//!    next level declined, and a timestamped completion list.
//! 3. **Prefetching:** The level's [`PrefetchUnit`], which reaches the structures
//!    above only through [`PrefetchHost`].
//!
//! Levels are chained by passing the levels below as a slice (`below`); the
//! first element is the next lower level and an empty slice marks the last level.

/// Outstanding-miss table.
pub mod mshr;

/// Cache replacement policy implementations (FIFO, LRU).
pub mod policies;

use std::collections::VecDeque;

use tracing::debug;

use self::mshr::MissTable;
use self::policies::{FifoPolicy, LruPolicy, ReplacementPolicy};
use crate::common::{CacheLevel, Request, RequestType};
use crate::config::{CacheConfig, ReplacementPolicy as PolicyType};
use crate::core::units::prefetch::{PrefetchHost, PrefetchUnit};
use crate::stats::CacheStats;

/// Stable handle to a line slot of a cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle(pub usize);

/// Cache line entry.
#[derive(Debug, Clone, Copy, Default)]
struct CacheLine {
    tag: u64,
    valid: bool,
    dirty: bool,
    /// Reserved for a fill that has not returned yet; never chosen as a victim.
    pending: bool,
}

/// An entry of the completion list.
#[derive(Debug, Clone)]
struct Scheduled {
    at: u64,
    req: Request,
    /// True when retiring the request completes a line fill.
    fill: bool,
}

/// Line storage and miss-handling state of one level.
#[derive(Debug)]
struct CacheStore {
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    line_bytes: u64,
    policy: Box<dyn ReplacementPolicy>,
    mshr: MissTable,
    retry: VecDeque<Request>,
    completions: Vec<Scheduled>,
    latency: u64,
    clock: u64,
    stats: CacheStats,
}

impl CacheStore {
    fn new(config: &CacheConfig) -> Self {
        let ways = config.ways.max(1);
        let num_sets = config.num_sets().max(1);
        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            PolicyType::Lru => Box::new(LruPolicy::new(num_sets, ways)),
            PolicyType::Fifo => Box::new(FifoPolicy::new(num_sets, ways)),
        };

        Self {
            lines: vec![CacheLine::default(); num_sets * ways],
            num_sets,
            ways,
            line_bytes: config.line_bytes.max(1) as u64,
            policy,
            mshr: MissTable::new(config.mshr_entries),
            retry: VecDeque::new(),
            completions: Vec::new(),
            latency: config.latency,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Line-aligned form of `addr`.
    #[inline]
    const fn line_addr(&self, addr: u64) -> u64 {
        addr - addr % self.line_bytes
    }

    #[inline]
    const fn set_and_tag(&self, addr: u64) -> (usize, u64) {
        let line = addr / self.line_bytes;
        (
            (line % self.num_sets as u64) as usize,
            line / self.num_sets as u64,
        )
    }

    /// Way holding a valid copy of `addr`.
    fn lookup(&self, addr: u64) -> Option<usize> {
        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.ways;
        (0..self.ways).find(|&way| {
            let line = &self.lines[base + way];
            line.valid && line.tag == tag
        })
    }

    /// Reserves a line for `addr`, preferring the policy's victim.
    ///
    /// Lines with a pending fill are skipped; returns `None` when every way of
    /// the set is pending.
    fn allocate_line(&mut self, addr: u64, dirty: bool) -> Option<LineHandle> {
        let (set, tag) = self.set_and_tag(addr);
        let base = set * self.ways;

        let preferred = self.policy.victim(set);
        let way = if self.lines[base + preferred].pending {
            (0..self.ways).find(|&way| !self.lines[base + way].pending)?
        } else {
            preferred
        };

        let idx = base + way;
        let victim = self.lines[idx];
        if victim.valid && victim.dirty {
            self.stats.writebacks += 1;
        }
        self.lines[idx] = CacheLine {
            tag,
            valid: false,
            dirty,
            pending: true,
        };
        self.policy.insert(set, way);
        Some(LineHandle(idx))
    }

    fn schedule(&mut self, at: u64, req: Request, fill: bool) {
        self.completions.push(Scheduled { at, req, fill });
    }

    /// Retires a request whose completion time has been reached.
    ///
    /// A fill clears the miss entry for its line and validates the line.
    /// Returns the request when a level above is waiting for it.
    fn complete(&mut self, scheduled: Scheduled) -> Option<Request> {
        let Scheduled { mut req, fill, .. } = scheduled;
        let line_addr = self.line_addr(req.addr);
        if let Some(entry) = fill.then(|| self.mshr.remove(line_addr)).flatten() {
            let line = &mut self.lines[entry.line.0];
            line.valid = true;
            line.pending = false;
            if entry.prefetch {
                self.stats.prefetch_fills += 1;
                return None;
            }
        }
        req.depart = Some(self.clock);
        Some(req)
    }

    fn is_idle(&self) -> bool {
        self.mshr.is_empty() && self.retry.is_empty() && self.completions.is_empty()
    }
}

/// The view of a level handed to its prefetch unit.
struct Port<'a> {
    store: &'a mut CacheStore,
    below: &'a mut [CacheSim],
}

impl PrefetchHost for Port<'_> {
    fn clock(&self) -> u64 {
        self.store.clock
    }

    fn latency(&self) -> u64 {
        self.store.latency
    }

    fn is_last_level(&self) -> bool {
        self.below.is_empty()
    }

    fn is_resident(&self, addr: u64) -> bool {
        self.store.lookup(addr).is_some()
    }

    fn mshr_contains(&self, addr: u64) -> bool {
        self.store.mshr.contains(self.store.line_addr(addr))
    }

    fn mshr_is_full(&self) -> bool {
        self.store.mshr.is_full()
    }

    fn allocate_line(&mut self, addr: u64) -> Option<LineHandle> {
        self.store.allocate_line(addr, false)
    }

    fn register_miss(&mut self, addr: u64, line: LineHandle, prefetch: bool) {
        let line_addr = self.store.line_addr(addr);
        let _ = self.store.mshr.register(line_addr, line, prefetch);
    }

    fn submit_lower(&mut self, req: Request) -> Result<(), Request> {
        match self.below.split_first_mut() {
            Some((next, rest)) => next.send(req, rest),
            None => Err(req),
        }
    }

    fn push_retry(&mut self, req: Request) {
        self.store.stats.retries += 1;
        self.store.retry.push_back(req);
    }

    fn enqueue_completion(&mut self, at: u64, req: Request) {
        self.store.schedule(at, req, true);
    }
}

/// One cache level: line store, miss handling, and prefetch unit.
#[derive(Debug)]
pub struct CacheSim {
    level: CacheLevel,
    /// Prefetch dispatcher for this level.
    pub prefetcher: PrefetchUnit,
    store: CacheStore,
}

impl CacheSim {
    /// Creates a cache level from its configuration.
    ///
    /// # Arguments
    ///
    /// * `level` - Identity of the level.
    /// * `config` - Geometry, latency, MSHR, and prefetcher settings. Expected
    ///   to have passed [`CacheConfig::validate`].
    pub fn new(level: CacheLevel, config: &CacheConfig) -> Self {
        Self {
            level,
            prefetcher: PrefetchUnit::new(level, config),
            store: CacheStore::new(config),
        }
    }

    /// Identity of this level.
    pub const fn level(&self) -> CacheLevel {
        self.level
    }

    /// Current simulated cycle of this level.
    pub const fn clock(&self) -> u64 {
        self.store.clock
    }

    /// Access and miss-handling counters.
    pub const fn stats(&self) -> &CacheStats {
        &self.store.stats
    }

    /// The outstanding-miss table.
    pub const fn mshr(&self) -> &MissTable {
        &self.store.mshr
    }

    /// Requests waiting to be re-offered to the next level.
    pub fn retry_len(&self) -> usize {
        self.store.retry.len()
    }

    /// Requests scheduled on the completion list.
    pub fn pending_completions(&self) -> usize {
        self.store.completions.len()
    }

    /// True when the line holding `addr` is valid here.
    pub fn contains(&self, addr: u64) -> bool {
        self.store.lookup(addr).is_some()
    }

    /// True when nothing is in flight at this level.
    pub fn is_idle(&self) -> bool {
        self.store.is_idle()
    }

    /// Offers a request to this level.
    ///
    /// A hit completes after the level's latency. A miss to a line already
    /// pending is folded into that fill: it is accepted but never completes on
    /// its own, since the line returns once, carrying the request that opened
    /// the miss. Callers counting completions see one per line fill.
    /// Otherwise a line and a miss entry are reserved and the request is
    /// forwarded to the next level (or completed after the level's latency at
    /// the last level). Accepted demand reads then drive the prefetch unit.
    ///
    /// # Arguments
    ///
    /// * `req` - The incoming request.
    /// * `below` - The levels under this one, nearest first.
    ///
    /// # Errors
    ///
    /// Hands the request back when the level cannot accept it this cycle
    /// (miss table full, or every way of the set awaiting a fill).
    pub fn send(&mut self, mut req: Request, below: &mut [Self]) -> Result<(), Request> {
        let store = &mut self.store;
        let line_addr = store.line_addr(req.addr);
        let is_write = req.req_type == RequestType::Write;
        req.arrive = store.clock;

        if let Some(way) = store.lookup(req.addr) {
            let (set, _) = store.set_and_tag(req.addr);
            let idx = set * store.ways + way;
            store.policy.touch(set, way);
            if is_write {
                store.lines[idx].dirty = true;
            }
            store.stats.hits += 1;
            let at = store.clock + store.latency;
            store.schedule(at, req.clone(), false);
        } else if let Some(entry) = store.mshr.get_mut(line_addr) {
            if entry.prefetch && !req.is_prefetch {
                store.stats.late_prefetches += 1;
            }
            entry.prefetch = false;
            if is_write {
                store.lines[entry.line.0].dirty = true;
            }
            store.stats.mshr_hits += 1;
        } else {
            if store.mshr.is_full() {
                store.stats.mshr_unavailable += 1;
                return Err(req);
            }
            let Some(line) = store.allocate_line(req.addr, is_write) else {
                store.stats.alloc_failures += 1;
                return Err(req);
            };
            let _ = store.mshr.register(line_addr, line, false);
            store.stats.misses += 1;

            match below.split_first_mut() {
                Some((next, rest)) => {
                    if let Err(declined) = next.send(req.clone(), rest) {
                        debug!(level = ?self.level, addr = declined.addr, "miss deferred to retry list");
                        store.stats.retries += 1;
                        store.retry.push_back(declined);
                    }
                }
                None => {
                    let at = store.clock + store.latency;
                    store.schedule(at, req.clone(), true);
                }
            }
        }
        store.stats.accesses += 1;

        if req.is_read() && !req.is_prefetch && self.prefetcher.exists_for_level() {
            let mut port = Port {
                store: &mut self.store,
                below,
            };
            self.prefetcher.activate(&req, &mut port);
        }
        Ok(())
    }

    /// Delivers a request returned by the next lower level.
    ///
    /// The request is retired on this level's next [`CacheSim::tick`].
    pub fn fill(&mut self, req: Request) {
        let at = self.store.clock;
        self.store.schedule(at, req, true);
    }

    /// Advances this level by one cycle.
    ///
    /// Re-offers parked requests to the next level, then retires every
    /// completion that is due.
    ///
    /// # Returns
    ///
    /// The requests that must be returned to the level above.
    pub fn tick(&mut self, below: &mut [Self]) -> Vec<Request> {
        let store = &mut self.store;
        store.clock += 1;

        if let Some((next, rest)) = below.split_first_mut() {
            let parked = std::mem::take(&mut store.retry);
            let offered = parked.len();
            for req in parked {
                if let Err(req) = next.send(req, rest) {
                    store.retry.push_back(req);
                }
            }
            if offered > store.retry.len() {
                debug!(
                    level = ?self.level,
                    accepted = offered - store.retry.len(),
                    "retry list drained"
                );
            }
        }

        let clock = store.clock;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut store.completions)
            .into_iter()
            .partition(|s| s.at <= clock);
        store.completions = waiting;

        due.into_iter()
            .filter_map(|scheduled| store.complete(scheduled))
            .collect()
    }
}
