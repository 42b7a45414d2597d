//! Prefetch Priority Tests.
//!
//! Verifies the distance bands: lines closer to the trigger are scheduled more
//! urgently, and anything at or beyond sixteen lines (or behind the trigger)
//! gets the lowest priority.

use proptest::prelude::*;
use rstest::rstest;

use pfsim_core::core::units::prefetch::priority_for_distance;

// ══════════════════════════════════════════════════════════
// 1. Band edges
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(0, 4)]
#[case(1, 4)]
#[case(3, 4)]
#[case(4, 3)]
#[case(7, 3)]
#[case(8, 2)]
#[case(11, 2)]
#[case(12, 1)]
#[case(15, 1)]
#[case(16, 0)]
#[case(1_000, 0)]
#[case(-1, 0)]
#[case(i64::MIN, 0)]
fn distance_band_maps_to_priority(#[case] distance: i64, #[case] expected: u8) {
    assert_eq!(priority_for_distance(distance), expected);
}

// ══════════════════════════════════════════════════════════
// 2. Shape
// ══════════════════════════════════════════════════════════

proptest! {
    /// Moving further ahead never raises the priority.
    #[test]
    fn priority_never_increases_with_distance(d in 0i64..64, step in 0i64..64) {
        prop_assert!(priority_for_distance(d + step) <= priority_for_distance(d));
    }

    /// Every band is four lines wide.
    #[test]
    fn bands_are_four_lines_wide(d in 0i64..16) {
        prop_assert_eq!(priority_for_distance(d), 4 - (d / 4) as u8);
    }
}
