//! Cache Replacement Policy Tests.
//!
//! Verifies the victim selection logic for the LRU and FIFO policies. Each policy
//! implements `ReplacementPolicy` with `touch(set, way)` for hits,
//! `insert(set, way)` for fills, and `victim(set) -> usize`.

use rstest::rstest;

use pfsim_core::core::units::cache::policies::{FifoPolicy, LruPolicy, ReplacementPolicy};

// ══════════════════════════════════════════════════════════
// 1. LRU Policy
// ══════════════════════════════════════════════════════════

/// Untouched ways are chosen first, lowest way winning ties.
#[test]
fn lru_initial_victim_is_way_zero() {
    let policy = LruPolicy::new(1, 4);
    assert_eq!(policy.victim(0), 0);
}

/// Filling ways in order 0..4 leaves way 0 least recently used.
#[test]
fn lru_sequential_fill_reorders() {
    let mut policy = LruPolicy::new(1, 4);
    for way in 0..4 {
        policy.insert(0, way);
    }
    assert_eq!(policy.victim(0), 0);
}

/// A hit protects the line it touches.
#[test]
fn lru_touch_protects_line() {
    let mut policy = LruPolicy::new(1, 4);
    for way in 0..4 {
        policy.insert(0, way);
    }
    policy.touch(0, 0);
    assert_eq!(policy.victim(0), 1);
}

/// Sets are tracked independently.
#[test]
fn lru_sets_are_independent() {
    let mut policy = LruPolicy::new(2, 2);
    policy.insert(0, 0);
    policy.insert(0, 1);
    policy.touch(0, 0);
    assert_eq!(policy.victim(0), 1);
    assert_eq!(policy.victim(1), 0);
}

// ══════════════════════════════════════════════════════════
// 2. FIFO Policy
// ══════════════════════════════════════════════════════════

/// FIFO cycles through the ways in installation order.
#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[case(8)]
fn fifo_round_robin(#[case] ways: usize) {
    let mut policy = FifoPolicy::new(1, ways);
    for expected in (0..ways).chain(0..ways) {
        let victim = policy.victim(0);
        assert_eq!(victim, expected);
        policy.insert(0, victim);
    }
}

/// Hits do not change the FIFO order.
#[test]
fn fifo_ignores_touch() {
    let mut policy = FifoPolicy::new(1, 4);
    policy.insert(0, 0);
    policy.touch(0, 1);
    policy.touch(0, 1);
    assert_eq!(policy.victim(0), 1);
}

/// Filling a way other than the oldest leaves the pointer in place.
#[test]
fn fifo_pointer_only_advances_on_oldest() {
    let mut policy = FifoPolicy::new(1, 4);
    policy.insert(0, 2);
    assert_eq!(policy.victim(0), 0);
}
