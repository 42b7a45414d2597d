//! Simulation statistics collection and reporting.
//!
//! This module tracks performance metrics for the cache hierarchy. It provides:
//! 1. **Per-level counters:** Accesses, hits, misses, and miss-table behaviour.
//! 2. **Prefetch counters:** Issued, folded, and dropped prefetches per level.
//! 3. **Reporting:** Sectioned text output in a fixed-width format.

use std::time::Instant;

use crate::common::CacheLevel;
use crate::core::units::prefetch::PrefetchStats;

/// Access and miss-handling counters of one cache level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests accepted by the level.
    pub accesses: u64,
    /// Accepted requests that found a valid line.
    pub hits: u64,
    /// Accepted requests that reserved a new line and miss entry.
    pub misses: u64,
    /// Accepted requests folded into a pending miss.
    pub mshr_hits: u64,
    /// Requests declined because the miss table was full.
    pub mshr_unavailable: u64,
    /// Requests declined because every way of the set awaited a fill.
    pub alloc_failures: u64,
    /// Dirty lines evicted.
    pub writebacks: u64,
    /// Requests parked because the next level declined them.
    pub retries: u64,
    /// Fills that only this level's prefetcher was waiting on.
    pub prefetch_fills: u64,
    /// Demand requests that found their line still being prefetched.
    pub late_prefetches: u64,
}

impl CacheStats {
    /// Fraction of accesses that missed, in percent.
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            (self.misses + self.mshr_hits) as f64 / self.accesses as f64 * 100.0
        }
    }
}

/// Snapshot of one level for reporting.
#[derive(Clone, Debug)]
pub struct LevelReport {
    /// Level identity.
    pub level: CacheLevel,
    /// Access counters.
    pub cache: CacheStats,
    /// Prefetch counters.
    pub prefetch: PrefetchStats,
}

/// Statistics of a whole hierarchy run.
#[derive(Clone, Debug)]
pub struct HierarchyStats {
    start_time: Instant,
    /// Cycles simulated.
    pub cycles: u64,
    /// Demand requests issued into the top level.
    pub requests: u64,
    /// Requests returned by the top level.
    pub completed: u64,
    /// Per-level snapshots, top level first.
    pub levels: Vec<LevelReport>,
}

impl Default for HierarchyStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            requests: 0,
            completed: 0,
            levels: Vec::new(),
        }
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"cache"`, `"prefetch"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "cache", "prefetch"];

impl HierarchyStats {
    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();

        if want("summary") {
            let khz = if seconds > 0.0 {
                (self.cycles as f64 / seconds) / 1000.0
            } else {
                0.0
            };
            println!("\n==========================================================");
            println!("CACHE HIERARCHY SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_freq                 {khz:.2} kHz");
            println!("sim_requests             {}", self.requests);
            println!("sim_completed            {}", self.completed);
            println!("----------------------------------------------------------");
        }
        if want("cache") {
            println!("MEMORY HIERARCHY");
            for report in &self.levels {
                let c = &report.cache;
                println!(
                    "  {:<3} accesses: {:<10} | hits: {:<10} | miss_rate: {:.2}%",
                    report.level.name(),
                    c.accesses,
                    c.hits,
                    c.miss_rate()
                );
                println!(
                    "      mshr.folded: {:<7} | mshr.full: {:<7} | writebacks: {:<7} | retries: {}",
                    c.mshr_hits, c.mshr_unavailable, c.writebacks, c.retries
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("prefetch") {
            println!("PREFETCH");
            for report in &self.levels {
                let p = &report.prefetch;
                let c = &report.cache;
                println!(
                    "  {:<3} issued: {:<10} | folded: {:<8} | dropped.full: {:<8} | dropped.no_line: {}",
                    report.level.name(),
                    p.issued,
                    p.folded,
                    p.dropped_full,
                    p.dropped_no_line
                );
                println!(
                    "      resident: {:<8} | deferred: {:<8} | fills: {:<8} | late: {}",
                    p.resident, p.deferred, c.prefetch_fills, c.late_prefetches
                );
            }
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
