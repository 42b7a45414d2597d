//! Outstanding-Miss Table (MSHR).
//!
//! A bounded table of in-flight line fills keyed by line address. A second miss
//! to a line that is already pending is folded into the existing entry instead
//! of issuing another fill.

use super::LineHandle;

/// One in-flight fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissEntry {
    /// Line-aligned address being filled.
    pub line_addr: u64,
    /// Line reserved for the fill.
    pub line: LineHandle,
    /// True while only this level's own prefetcher is waiting on the fill.
    pub prefetch: bool,
}

/// Bounded outstanding-miss table.
#[derive(Debug, Clone)]
pub struct MissTable {
    entries: Vec<MissEntry>,
    capacity: usize,
}

impl MissTable {
    /// Creates an empty table holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pending fills.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no fill is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no further miss can be registered.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// True when a fill for `line_addr` is pending.
    pub fn contains(&self, line_addr: u64) -> bool {
        self.entries.iter().any(|e| e.line_addr == line_addr)
    }

    /// Pending entry for `line_addr`.
    pub fn get_mut(&mut self, line_addr: u64) -> Option<&mut MissEntry> {
        self.entries.iter_mut().find(|e| e.line_addr == line_addr)
    }

    /// Registers a new pending fill.
    ///
    /// Returns `false`, leaving the table unchanged, when the table is full or the
    /// line is already pending.
    pub fn register(&mut self, line_addr: u64, line: LineHandle, prefetch: bool) -> bool {
        if self.is_full() || self.contains(line_addr) {
            return false;
        }
        self.entries.push(MissEntry {
            line_addr,
            line,
            prefetch,
        });
        true
    }

    /// Removes and returns the entry for `line_addr`.
    pub fn remove(&mut self, line_addr: u64) -> Option<MissEntry> {
        let pos = self.entries.iter().position(|e| e.line_addr == line_addr)?;
        Some(self.entries.swap_remove(pos))
    }
}
