//! Global History Buffer (Markov) Prefetcher.
//!
//! Remembers arbitrary recurring address sequences instead of a fixed stride.
//! Two bounded structures are kept:
//!
//! - **History Buffer:** a FIFO ring of entries. Each entry records an observed
//!   address, the address observed right after it, and a link to the previous
//!   entry for the same address.
//! - **Index Table:** a small FIFO map from address to its newest buffer entry.
//!
//! Entries are named by a monotonically increasing sequence number; the ring slot
//! is `seq % capacity`. A sequence number older than the oldest live entry is
//! stale, so chain links and index entries can never resolve to an overwritten
//! slot. When the ring overwrites the entry an index entry points at, that index
//! entry is removed in the same step.
//!
//! On a read of `A` whose index lookup hits, the chain for `A` is walked newest
//! first and every recorded successor becomes a prefetch candidate.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `observe()`: O(I + B) worst case (index scan plus chain walk)
//! - **Space Complexity:** O(B + I) where B is the buffer and I the index capacity

use std::collections::VecDeque;

use tracing::trace;

/// One History Buffer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HistoryEntry {
    /// Observed address.
    addr: u64,
    /// Address observed immediately after this one, once known.
    successor: Option<u64>,
    /// Sequence number of the previous entry for the same address.
    prev: Option<u64>,
}

/// One Index Table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    addr: u64,
    seq: u64,
}

/// Global history buffer prefetcher state.
#[derive(Debug, Clone)]
pub struct GlobalHistoryPrefetcher {
    /// Ring storage; grows to `capacity` and is then overwritten in place.
    buffer: Vec<HistoryEntry>,
    capacity: usize,
    /// Sequence number the next entry will receive.
    next_seq: u64,
    index: VecDeque<IndexEntry>,
    index_capacity: usize,
}

impl GlobalHistoryPrefetcher {
    /// Creates a new global history prefetcher.
    ///
    /// # Arguments
    ///
    /// * `buffer_capacity` - History Buffer entries.
    /// * `index_capacity` - Index Table entries.
    pub fn new(buffer_capacity: usize, index_capacity: usize) -> Self {
        let capacity = buffer_capacity.max(1);
        let index_capacity = index_capacity.max(1);
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            next_seq: 0,
            index: VecDeque::with_capacity(index_capacity),
            index_capacity,
        }
    }

    /// Observes a read and appends its predicted successors to `out`.
    ///
    /// Nothing is predicted on the first sighting of an address (or once its
    /// index entry has been evicted). Candidates are ordered newest first and
    /// contain no duplicates.
    pub fn observe(&mut self, addr: u64, out: &mut Vec<u64>) {
        if let Some(newest) = self.newest_mut() {
            newest.successor = Some(addr);
        }

        let head = self.lookup(addr);
        if let Some(head) = head {
            self.walk(head, out);
        }

        let seq = self.push(HistoryEntry {
            addr,
            successor: None,
            prev: head,
        });
        self.point_index(addr, seq);
    }

    /// Number of live History Buffer entries.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of Index Table entries.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// True when `addr` currently has an Index Table entry.
    pub fn is_indexed(&self, addr: u64) -> bool {
        self.index.iter().any(|e| e.addr == addr)
    }

    /// Addresses in the Index Table, oldest insertion first.
    pub fn indexed_addrs(&self) -> impl Iterator<Item = u64> + '_ {
        self.index.iter().map(|e| e.addr)
    }

    /// Checks that every index entry resolves to a live buffer entry for the
    /// same address and that no chain link skips forward in time.
    pub fn is_consistent(&self) -> bool {
        let index_ok = self
            .index
            .iter()
            .all(|e| self.entry(e.seq).is_some_and(|entry| entry.addr == e.addr));
        let links_ok = (self.oldest_seq()..self.next_seq).all(|seq| {
            self.entry(seq)
                .and_then(|entry| entry.prev)
                .is_none_or(|prev| prev < seq)
        });
        index_ok && links_ok
    }

    const fn oldest_seq(&self) -> u64 {
        self.next_seq - self.buffer.len() as u64
    }

    const fn slot(&self, seq: u64) -> usize {
        (seq % self.capacity as u64) as usize
    }

    fn entry(&self, seq: u64) -> Option<&HistoryEntry> {
        if seq < self.oldest_seq() || seq >= self.next_seq {
            return None;
        }
        self.buffer.get(self.slot(seq))
    }

    fn newest_mut(&mut self) -> Option<&mut HistoryEntry> {
        let seq = self.next_seq.checked_sub(1)?;
        if self.buffer.is_empty() {
            return None;
        }
        let slot = self.slot(seq);
        self.buffer.get_mut(slot)
    }

    fn lookup(&self, addr: u64) -> Option<u64> {
        self.index.iter().find(|e| e.addr == addr).map(|e| e.seq)
    }

    /// Follows the chain from `head`, collecting successors newest first.
    fn walk(&self, head: u64, out: &mut Vec<u64>) {
        let mut cursor = Some(head);
        while let Some(seq) = cursor {
            let Some(entry) = self.entry(seq) else {
                break;
            };
            if let Some(successor) = entry.successor.filter(|s| !out.contains(s)) {
                out.push(successor);
            }
            cursor = entry.prev;
        }
    }

    /// Appends an entry, overwriting the oldest one when the ring is full.
    fn push(&mut self, entry: HistoryEntry) -> u64 {
        let seq = self.next_seq;
        if self.buffer.len() < self.capacity {
            self.buffer.push(entry);
        } else {
            let oldest = self.oldest_seq();
            let slot = self.slot(oldest);
            let evicted = std::mem::replace(&mut self.buffer[slot], entry);
            let before = self.index.len();
            self.index
                .retain(|e| !(e.addr == evicted.addr && e.seq == oldest));
            if self.index.len() != before {
                trace!(addr = evicted.addr, "history index entry evicted with its buffer slot");
            }
        }
        self.next_seq += 1;
        seq
    }

    /// Points the index entry for `addr` at `seq`, inserting it if absent.
    fn point_index(&mut self, addr: u64, seq: u64) {
        if let Some(entry) = self.index.iter_mut().find(|e| e.addr == addr) {
            entry.seq = seq;
            return;
        }
        if self.index.len() >= self.index_capacity {
            if let Some(old) = self.index.pop_front() {
                trace!(addr = old.addr, "history index full, oldest entry evicted");
            }
        }
        self.index.push_back(IndexEntry { addr, seq });
    }
}
