// crates/muster-core/tests/proptest_scoring.rs
// ============================================================================
// Module: Scoring Property Tests
// Description: Property-based checks for the documented scoring laws.
// Purpose: Ensure score invariants hold across arbitrary tallies.
// Dependencies: muster-core, proptest
// ============================================================================

//! Property tests for the scoring laws: not-applicable neutrality, score
//! bounds, and strict improvement when a failed row is satisfied.

use muster_core::scoring::StatusTally;
use muster_core::scoring::cmmc_score;
use muster_core::scoring::weighted_score;
use proptest::prelude::ProptestConfig;
use proptest::prop_assert;
use proptest::prop_compose;
use proptest::proptest;

prop_compose! {
    /// Generates an arbitrary bounded status tally.
    fn arb_tally()(
        satisfied in 0u64..200,
        partially_satisfied in 0u64..200,
        not_satisfied in 0u64..200,
        not_applicable in 0u64..200,
        not_assessed in 0u64..200,
        risk_accepted in 0u64..200,
    ) -> StatusTally {
        StatusTally {
            satisfied,
            partially_satisfied,
            not_satisfied,
            not_applicable,
            not_assessed,
            risk_accepted,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn scores_stay_within_percent_bounds(tally in arb_tally()) {
        let weighted = weighted_score(&tally);
        let cmmc = cmmc_score(&tally);
        prop_assert!((0.0..=100.0).contains(&weighted));
        prop_assert!((0.0..=100.0).contains(&cmmc));
    }

    #[test]
    fn not_applicable_rows_never_change_the_score(tally in arb_tally(), extra in 1u64..50) {
        let mut widened = tally;
        widened.not_applicable += extra;
        let before = weighted_score(&tally);
        let after = weighted_score(&widened);
        prop_assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn satisfying_a_failed_row_strictly_increases(tally in arb_tally()) {
        let mut with_failure = tally;
        with_failure.not_satisfied += 1;
        let mut repaired = with_failure;
        repaired.not_satisfied -= 1;
        repaired.satisfied += 1;
        prop_assert!(weighted_score(&repaired) > weighted_score(&with_failure));
    }

    #[test]
    fn all_not_applicable_scores_one_hundred(count in 1u64..500) {
        let tally = StatusTally {
            not_applicable: count,
            ..StatusTally::default()
        };
        prop_assert!((weighted_score(&tally) - 100.0).abs() < f64::EPSILON);
    }
}
