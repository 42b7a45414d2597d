//! Clocked Cache Hierarchy.
//!
//! Chains the enabled cache levels top to bottom and advances them in lockstep.
//! It provides:
//! 1. **Construction:** Validates the configuration and builds L1, L2, and L3 in
//!    order, skipping disabled levels. The deepest enabled level is the last level.
//! 2. **Issue:** Demand requests enter at the top level.
//! 3. **Clocking:** Levels tick bottom-up so a fill returned by a lower level is
//!    retired by the level above in the same cycle.
//! 4. **Replay:** Drives a whole trace through the hierarchy and drains it.

use tracing::debug;

use crate::common::{CacheLevel, ConfigError, Request};
use crate::config::Config;
use crate::core::units::cache::CacheSim;
use crate::stats::{HierarchyStats, LevelReport};

/// A chain of cache levels sharing one clock.
#[derive(Debug)]
pub struct MemoryHierarchy {
    levels: Vec<CacheSim>,
    cycles: u64,
    stats: HierarchyStats,
}

impl MemoryHierarchy {
    /// Builds the hierarchy described by `config`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, or [`ConfigError::NoLevels`]
    /// when every level is disabled.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let levels: Vec<CacheSim> = CacheLevel::ALL
            .into_iter()
            .map(|level| (level, config.cache.level(level)))
            .filter(|(_, c)| c.enabled)
            .map(|(level, c)| CacheSim::new(level, c))
            .collect();

        if levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        debug!(
            levels = ?levels.iter().map(CacheSim::level).collect::<Vec<_>>(),
            "cache hierarchy built"
        );

        Ok(Self {
            levels,
            cycles: 0,
            stats: HierarchyStats::default(),
        })
    }

    /// Levels, top first.
    pub fn levels(&self) -> &[CacheSim] {
        &self.levels
    }

    /// The level with identity `level`, if enabled.
    pub fn level(&self, level: CacheLevel) -> Option<&CacheSim> {
        self.levels.iter().find(|c| c.level() == level)
    }

    /// Cycles simulated so far.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Offers a request to the top level.
    ///
    /// # Errors
    ///
    /// Hands the request back when the top level cannot accept it this cycle.
    pub fn send(&mut self, req: Request) -> Result<(), Request> {
        let Some((top, below)) = self.levels.split_first_mut() else {
            return Err(req);
        };
        top.send(req, below)?;
        self.stats.requests += 1;
        Ok(())
    }

    /// Advances every level by one cycle.
    ///
    /// # Returns
    ///
    /// The requests the top level completed this cycle.
    pub fn tick(&mut self) -> Vec<Request> {
        self.cycles += 1;
        let mut returned = Vec::new();
        for i in (0..self.levels.len()).rev() {
            let (upper, lower) = self.levels.split_at_mut(i + 1);
            let Some((current, above)) = upper.split_last_mut() else {
                continue;
            };
            let done = current.tick(lower);
            match above.last_mut() {
                Some(parent) => done.into_iter().for_each(|req| parent.fill(req)),
                None => returned = done,
            }
        }
        self.stats.completed += returned.len() as u64;
        returned
    }

    /// True when no level has work in flight.
    pub fn is_idle(&self) -> bool {
        self.levels.iter().all(CacheSim::is_idle)
    }

    /// Ticks until the hierarchy is idle or `max_cycles` have elapsed.
    ///
    /// # Returns
    ///
    /// The requests completed at the top level while draining.
    pub fn drain(&mut self, max_cycles: u64) -> Vec<Request> {
        let mut completed = Vec::new();
        for _ in 0..max_cycles {
            if self.is_idle() {
                break;
            }
            completed.extend(self.tick());
        }
        if !self.is_idle() {
            debug!(cycles = self.cycles, "drain stopped with work still in flight");
        }
        completed
    }

    /// Issues every request of `trace` in order, one per cycle, then drains.
    ///
    /// A request the top level declines is re-offered on the following cycles
    /// until accepted.
    ///
    /// # Arguments
    ///
    /// * `trace` - Requests in program order.
    /// * `max_cycles` - Bound on cycles spent waiting for a single request to be
    ///   accepted and on the final drain.
    ///
    /// # Returns
    ///
    /// The requests completed at the top level, in completion order.
    pub fn replay(&mut self, trace: &[Request], max_cycles: u64) -> Vec<Request> {
        let mut completed = Vec::new();
        for req in trace {
            let mut pending = req.clone();
            let mut waited = 0;
            loop {
                match self.send(pending) {
                    Ok(()) => break,
                    Err(declined) if waited < max_cycles => {
                        pending = declined;
                        waited += 1;
                        completed.extend(self.tick());
                    }
                    Err(declined) => {
                        debug!(addr = declined.addr, "request abandoned after {waited} cycles");
                        break;
                    }
                }
            }
            completed.extend(self.tick());
        }
        completed.extend(self.drain(max_cycles));
        completed
    }

    /// Snapshot of the run's statistics.
    pub fn stats(&self) -> HierarchyStats {
        let mut stats = self.stats.clone();
        stats.cycles = self.cycles;
        stats.levels = self
            .levels
            .iter()
            .map(|c| LevelReport {
                level: c.level(),
                cache: c.stats().clone(),
                prefetch: c.prefetcher.stats.clone(),
            })
            .collect();
        stats
    }
}
