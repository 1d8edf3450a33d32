// crates/muster-core/src/core/scoring/tests.rs
// ============================================================================
// Module: Scoring Tests
// Description: Scoring-law checks for the weighted, CMMC, and IV&V rules.
// Purpose: Pin the documented score formulas and edge cases.
// Dependencies: none
// ============================================================================

use std::collections::BTreeMap;

use super::GroupScore;
use super::StatusTally;
use super::area_pass_rate;
use super::cmmc_score;
use super::grouping_scores;
use super::ivv_overall;
use super::overall_from_groups;
use super::posture_label;
use super::readiness_label;
use super::round1;
use super::weighted_score;
use crate::core::status::ControlStatus;

#[test]
fn all_not_applicable_scores_one_hundred() {
    let tally = StatusTally {
        not_applicable: 7,
        ..StatusTally::default()
    };
    assert!((weighted_score(&tally) - 100.0).abs() < f64::EPSILON);
    assert!((cmmc_score(&tally) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn adding_not_applicable_does_not_change_score() {
    let mut tally = StatusTally {
        satisfied: 3,
        not_satisfied: 2,
        ..StatusTally::default()
    };
    let before = weighted_score(&tally);
    tally.add(ControlStatus::NotApplicable);
    let after = weighted_score(&tally);
    assert!((before - after).abs() < f64::EPSILON);
}

#[test]
fn satisfying_a_failed_row_strictly_increases_score() {
    let before = StatusTally {
        satisfied: 3,
        not_satisfied: 2,
        not_assessed: 1,
        ..StatusTally::default()
    };
    let after = StatusTally {
        satisfied: 4,
        not_satisfied: 1,
        not_assessed: 1,
        ..StatusTally::default()
    };
    assert!(weighted_score(&after) > weighted_score(&before));
}

#[test]
fn weighted_score_credits_partial_and_risk_accepted() {
    let tally = StatusTally {
        satisfied: 1,
        partially_satisfied: 2,
        risk_accepted: 1,
        not_satisfied: 0,
        ..StatusTally::default()
    };
    // 100 * (1 + 1.0 + 0.75) / 4 = 68.75
    assert!((weighted_score(&tally) - 68.75).abs() < 1e-9);
}

#[test]
fn cmmc_fixture_scores_ninety_four_point_four() {
    // 8 met, 1 partially_met, 1 not_applicable.
    let tally = StatusTally {
        satisfied: 8,
        partially_satisfied: 1,
        not_applicable: 1,
        ..StatusTally::default()
    };
    let score = round1(cmmc_score(&tally));
    assert!((score - 94.4).abs() < f64::EPSILON);
    assert_eq!(readiness_label(score), "Ready");
}

#[test]
fn ivv_overall_weights_verification_sixty_percent() {
    let overall = ivv_overall(90.0, 50.0);
    assert!((overall - 74.0).abs() < 1e-9);

    let tally = StatusTally {
        satisfied: 1,
        partially_satisfied: 1,
        not_satisfied: 2,
        ..StatusTally::default()
    };
    // 100 * (1 + 0.5) / 4 = 37.5
    assert!((area_pass_rate(&tally) - 37.5).abs() < 1e-9);
}

#[test]
fn grouping_rollup_averages_populated_groups_only() {
    let rows = vec![
        ("AC".to_string(), ControlStatus::Satisfied),
        ("AC".to_string(), ControlStatus::Satisfied),
        ("AU".to_string(), ControlStatus::NotSatisfied),
    ];
    let groups = grouping_scores(rows, weighted_score);
    assert_eq!(groups.len(), 2);
    let overall = overall_from_groups(&groups);
    // AC = 100.0, AU = 0.0 -> 50.0
    assert!((overall - 50.0).abs() < f64::EPSILON);

    let empty: BTreeMap<String, GroupScore> = BTreeMap::new();
    assert!((overall_from_groups(&empty) - 0.0).abs() < f64::EPSILON);
}

#[test]
fn posture_labels_follow_thresholds() {
    assert_eq!(posture_label(95.0), "Strong");
    assert_eq!(posture_label(90.0), "Strong");
    assert_eq!(posture_label(89.9), "Moderate");
    assert_eq!(posture_label(70.0), "Moderate");
    assert_eq!(posture_label(69.9), "Developing");
    assert_eq!(posture_label(50.0), "Developing");
    assert_eq!(posture_label(49.9), "Weak");
}
