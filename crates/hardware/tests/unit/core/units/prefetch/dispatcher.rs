//! Prefetch Dispatcher Tests.
//!
//! Verifies the single admission path shared by every engine: the order of the
//! zero-depth, residency, duplicate, capacity, and allocation checks, the shape
//! of the speculative request, and where it is handed (next level, retry list,
//! or completion list). Also covers engine selection per level and activation.

use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use rstest::rstest;

use pfsim_core::common::{CacheLevel, Request, RequestType};
use pfsim_core::config::{CacheConfig, Prefetcher};
use pfsim_core::core::units::cache::LineHandle;
use pfsim_core::core::units::prefetch::{AdmitOutcome, PrefetchStats, PrefetchUnit};

use crate::common::mocks::{MockHost, RecordingHost};
use crate::common::{LINE, small_cache};

fn unit(level: CacheLevel, prefetcher: Prefetcher) -> PrefetchUnit {
    PrefetchUnit::new(level, &small_cache(prefetcher))
}

fn trigger(addr: u64) -> Request {
    Request::new(addr, RequestType::Read, 3)
}

// ══════════════════════════════════════════════════════════
// 1. Rejections leave no trace
// ══════════════════════════════════════════════════════════

/// A prediction equal to the trigger address builds nothing.
#[test]
fn zero_depth_candidate_is_ignored() {
    let mut pf = unit(CacheLevel::L3, Prefetcher::NextLine);
    let mut host = RecordingHost::new();

    let outcome = pf.admit(0x1000, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::ZeroDepth);
    assert!(host.untouched());
    assert_eq!(pf.stats.zero_depth, 1);
}

/// A line that is already valid is not fetched again.
#[test]
fn resident_line_is_not_prefetched() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new().with_resident(0x1040);

    let outcome = pf.admit(0x1040, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::Resident);
    assert!(host.untouched());
}

/// A candidate whose line is already pending folds into that miss.
#[test]
fn pending_line_is_folded() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new().with_pending(0x1040);

    let outcome = pf.admit(0x1048, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::Folded);
    assert!(host.untouched());
    assert_eq!(host.pending.len(), 1, "no second entry for the same line");
}

/// A full miss table drops the candidate before any line is reserved.
#[test]
fn full_miss_table_drops_without_allocating() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new().with_pending(0x8000);
    host.mshr_capacity = 1;

    let outcome = pf.admit(0x1040, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::DroppedFull);
    assert!(host.untouched());
    assert_eq!(pf.stats.dropped_full, 1);
}

/// Allocation failure drops the candidate before a miss is registered.
#[test]
fn allocation_failure_drops_without_registering() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();
    host.fail_alloc = true;

    let outcome = pf.admit(0x1040, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::DroppedNoLine);
    assert!(host.registered.is_empty());
    assert!(host.submitted.is_empty());
    assert_eq!(pf.stats.dropped_no_line, 1);
}

/// Resident lines short-circuit before any miss-table or allocator call.
#[test]
fn resident_check_precedes_every_mutation() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = MockHost::new();
    let _ = host
        .expect_is_resident()
        .with(eq(0x2040))
        .times(1)
        .return_const(true);
    let _ = host.expect_mshr_contains().times(0);
    let _ = host.expect_allocate_line().times(0);
    let _ = host.expect_register_miss().times(0);
    let _ = host.expect_submit_lower().times(0);

    assert_eq!(
        pf.admit(0x2040, &trigger(0x2000), &mut host),
        AdmitOutcome::Resident
    );
}

/// The capacity check runs before the allocator is asked for a line.
#[test]
fn capacity_check_precedes_allocation() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = MockHost::new();
    let _ = host.expect_is_resident().return_const(false);
    let _ = host.expect_mshr_contains().return_const(false);
    let _ = host.expect_mshr_is_full().times(1).return_const(true);
    let _ = host.expect_allocate_line().times(0);
    let _ = host.expect_register_miss().times(0);

    assert_eq!(
        pf.admit(0x2040, &trigger(0x2000), &mut host),
        AdmitOutcome::DroppedFull
    );
}

/// An admitted candidate registers exactly one prefetch miss on the reserved line.
#[test]
fn admission_registers_prefetch_miss_on_reserved_line() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = MockHost::new();
    let _ = host.expect_is_resident().return_const(false);
    let _ = host.expect_mshr_contains().return_const(false);
    let _ = host.expect_mshr_is_full().return_const(false);
    let _ = host
        .expect_allocate_line()
        .with(eq(0x2080))
        .times(1)
        .return_const(Some(LineHandle(7)));
    let _ = host
        .expect_register_miss()
        .with(eq(0x2080), eq(LineHandle(7)), eq(true))
        .times(1)
        .return_const(());
    let _ = host.expect_clock().return_const(5u64);
    let _ = host.expect_is_last_level().return_const(false);
    let _ = host.expect_submit_lower().times(1).returning(|_| Ok(()));

    assert_eq!(
        pf.admit(0x2080, &trigger(0x2000), &mut host),
        AdmitOutcome::Forwarded
    );
}

// ══════════════════════════════════════════════════════════
// 2. The speculative request
// ══════════════════════════════════════════════════════════

/// The built request is a prefetch read carrying distance and priority.
#[test]
fn forwarded_request_carries_scheduling_fields() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();

    let outcome = pf.admit(0x1000 + 5 * LINE, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::Forwarded);
    assert_eq!(host.submitted.len(), 1);
    let req = &host.submitted[0];
    assert_eq!(req.addr, 0x1000 + 5 * LINE);
    assert_eq!(req.req_type, RequestType::Read);
    assert!(req.is_prefetch);
    assert_eq!(req.distance, 5);
    assert_eq!(req.priority, 3);
    assert_eq!(req.core_id, 3, "core id inherited from the trigger");
    assert_eq!(req.arrive, host.clock);
    assert_eq!(req.depart, None);
    assert_eq!(host.prefetched(), vec![0x1000 + 5 * LINE]);
}

/// Distance is measured in whole lines, not bytes.
#[test]
fn distance_ignores_offsets_within_a_line() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();

    let _ = pf.admit(0x1000 + LINE + 8, &trigger(0x1000 + 60), &mut host);

    assert_eq!(host.submitted[0].distance, 1);
    assert_eq!(host.submitted[0].priority, 4);
}

/// Distance is a line count even when lines are large.
#[test]
fn distance_is_counted_in_lines_not_bytes() {
    let config = CacheConfig {
        line_bytes: 4 * LINE as usize,
        size_bytes: 4096,
        ..small_cache(Prefetcher::NextLine)
    };
    let mut pf = PrefetchUnit::new(CacheLevel::L1, &config);
    let mut host = RecordingHost::new();

    let _ = pf.admit(0x4000 + 8 * 4 * LINE, &trigger(0x4000), &mut host);

    assert_eq!(host.submitted[0].distance, 8);
    assert_eq!(host.submitted[0].priority, 2);
}

/// Adjacent lines straddling the signed boundary are one line apart.
#[test]
fn distance_across_signed_boundary_does_not_overflow() {
    let config = CacheConfig {
        line_bytes: 1,
        ..small_cache(Prefetcher::NextLine)
    };
    let mut pf = PrefetchUnit::new(CacheLevel::L1, &config);
    let mut host = RecordingHost::new();
    let boundary = 1u64 << 63;

    let outcome = pf.admit(boundary, &trigger(boundary - 1), &mut host);

    assert_eq!(outcome, AdmitOutcome::Forwarded);
    assert_eq!(host.submitted[0].distance, 1);
    assert_eq!(host.submitted[0].priority, 4);
}

/// A candidate below the trigger gets a negative distance and the lowest priority.
#[test]
fn backward_candidate_gets_lowest_priority() {
    let mut pf = unit(CacheLevel::L2, Prefetcher::GlobalHistory);
    let mut host = RecordingHost::new();

    let _ = pf.admit(0x1000 - 2 * LINE, &trigger(0x1000), &mut host);

    assert_eq!(host.submitted[0].distance, -2);
    assert_eq!(host.submitted[0].priority, 0);
}

// ══════════════════════════════════════════════════════════
// 3. Hand-off
// ══════════════════════════════════════════════════════════

/// A declined prefetch is parked on the retry list, not dropped.
#[test]
fn declined_prefetch_goes_to_retry_list() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();
    host.decline_lower = true;

    let outcome = pf.admit(0x1040, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::Deferred);
    assert!(outcome.is_issued());
    assert_eq!(host.retries.len(), 1);
    assert!(host.retries[0].is_prefetch);
    assert_eq!(host.prefetched(), vec![0x1040], "miss stays registered");
    assert_eq!(pf.stats.issued, 1);
    assert_eq!(pf.stats.deferred, 1);
}

/// At the last level the prefetch completes after the level's latency.
#[test]
fn last_level_schedules_completion() {
    let mut pf = unit(CacheLevel::L3, Prefetcher::NextLine);
    let mut host = RecordingHost::last_level();

    let outcome = pf.admit(0x1040, &trigger(0x1000), &mut host);

    assert_eq!(outcome, AdmitOutcome::Queued);
    assert!(host.submitted.is_empty());
    assert_eq!(host.completions.len(), 1);
    let (at, req) = &host.completions[0];
    assert_eq!(*at, host.clock + host.latency);
    assert!(req.is_prefetch);
}

/// A second candidate for the same line folds into the first.
#[test]
fn repeated_candidate_folds_into_first() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();

    let first = pf.admit(0x1040, &trigger(0x1000), &mut host);
    let second = pf.admit(0x1040, &trigger(0x1008), &mut host);

    assert_eq!(first, AdmitOutcome::Forwarded);
    assert_eq!(second, AdmitOutcome::Folded);
    assert_eq!(host.submitted.len(), 1);
    assert_eq!(
        pf.stats,
        PrefetchStats {
            issued: 1,
            folded: 1,
            ..PrefetchStats::default()
        }
    );
}

/// Prefetches may never be derived from a write.
#[test]
#[should_panic(expected = "non-read")]
fn admit_rejects_write_trigger() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();
    let _ = pf.admit(0x1040, &Request::write(0x1000), &mut host);
}

// ══════════════════════════════════════════════════════════
// 4. Engine selection and activation
// ══════════════════════════════════════════════════════════

/// Each engine applies only to the levels it is meant for.
#[rstest]
#[case(Prefetcher::None, CacheLevel::L1, false)]
#[case(Prefetcher::None, CacheLevel::L3, false)]
#[case(Prefetcher::NextLine, CacheLevel::L1, true)]
#[case(Prefetcher::NextLine, CacheLevel::L2, true)]
#[case(Prefetcher::NextLine, CacheLevel::L3, true)]
#[case(Prefetcher::AdaptiveStream, CacheLevel::L1, false)]
#[case(Prefetcher::AdaptiveStream, CacheLevel::L2, false)]
#[case(Prefetcher::AdaptiveStream, CacheLevel::L3, true)]
#[case(Prefetcher::GlobalHistory, CacheLevel::L1, false)]
#[case(Prefetcher::GlobalHistory, CacheLevel::L2, true)]
#[case(Prefetcher::GlobalHistory, CacheLevel::L3, true)]
fn engine_applies_to_level(
    #[case] prefetcher: Prefetcher,
    #[case] level: CacheLevel,
    #[case] expected: bool,
) {
    let pf = unit(level, prefetcher);
    assert_eq!(pf.exists_for_level(), expected);
    assert_eq!(pf.level(), level);
    assert_eq!(pf.engine().is_some(), prefetcher != Prefetcher::None);
}

/// Activation with the next-line engine issues the following line.
#[test]
fn next_line_activation_issues_one_line_ahead() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();

    pf.activate(&trigger(0x4000), &mut host);

    assert_eq!(host.prefetched(), vec![0x4000 + LINE]);
    assert_eq!(host.submitted[0].distance, 1);
}

/// Activation with no engine configured does nothing.
#[test]
fn activation_without_engine_is_inert() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::None);
    let mut host = RecordingHost::new();

    pf.activate(&trigger(0x4000), &mut host);

    assert!(host.untouched());
    assert_eq!(pf.stats, PrefetchStats::default());
}

/// Global history activation admits every remembered successor.
#[test]
fn global_history_activation_admits_all_successors() {
    let mut pf = unit(CacheLevel::L2, Prefetcher::GlobalHistory);
    let mut host = RecordingHost::new();
    let (a, b, c) = (0x10_000, 0x20_000, 0x30_000);

    for addr in [a, b, a, c] {
        pf.activate(&trigger(addr), &mut host);
    }
    host.submitted.clear();
    host.pending.clear();
    pf.activate(&trigger(a), &mut host);

    let addrs: Vec<u64> = host.submitted.iter().map(|r| r.addr).collect();
    assert_eq!(addrs, vec![c, b]);
}

/// Only reads may activate the prefetcher.
#[test]
#[should_panic(expected = "prefetcher activated by a Write")]
fn activate_rejects_write() {
    let mut pf = unit(CacheLevel::L1, Prefetcher::NextLine);
    let mut host = RecordingHost::new();
    pf.activate(&Request::write(0x4000), &mut host);
}
