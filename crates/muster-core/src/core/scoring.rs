// crates/muster-core/src/core/scoring.rs
// ============================================================================
// Module: Assessment Scoring
// Description: Deterministic score computation over canonical status tallies.
// Purpose: Provide the weighted, CMMC, and IV&V scoring rules plus roll-ups.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! All scores are percentages computed from per-status counts. The
//! denominator always excludes `not_applicable` rows and includes everything
//! else (including `not_assessed`). Scores must be reproducible from stored
//! rows alone; nothing here reads external state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::status::ControlStatus;

// ============================================================================
// SECTION: Status Tally
// ============================================================================

/// Per-status row counts for one scoring scope.
///
/// # Invariants
/// - `total()` is the sum of all six counters.
/// - `assessable()` excludes only `not_applicable`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTally {
    /// Count of `satisfied` rows.
    pub satisfied: u64,
    /// Count of `partially_satisfied` rows.
    pub partially_satisfied: u64,
    /// Count of `not_satisfied` rows.
    pub not_satisfied: u64,
    /// Count of `not_applicable` rows.
    pub not_applicable: u64,
    /// Count of `not_assessed` rows.
    pub not_assessed: u64,
    /// Count of `risk_accepted` rows.
    pub risk_accepted: u64,
}

impl StatusTally {
    /// Tallies an iterator of canonical statuses.
    #[must_use]
    pub fn from_statuses<I: IntoIterator<Item = ControlStatus>>(statuses: I) -> Self {
        let mut tally = Self::default();
        for status in statuses {
            tally.add(status);
        }
        tally
    }

    /// Adds one status to the tally.
    pub const fn add(&mut self, status: ControlStatus) {
        match status {
            ControlStatus::Satisfied => self.satisfied += 1,
            ControlStatus::PartiallySatisfied => self.partially_satisfied += 1,
            ControlStatus::NotSatisfied => self.not_satisfied += 1,
            ControlStatus::NotApplicable => self.not_applicable += 1,
            ControlStatus::NotAssessed => self.not_assessed += 1,
            ControlStatus::RiskAccepted => self.risk_accepted += 1,
        }
    }

    /// Returns the total row count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.satisfied
            + self.partially_satisfied
            + self.not_satisfied
            + self.not_applicable
            + self.not_assessed
            + self.risk_accepted
    }

    /// Returns the assessable row count (total minus `not_applicable`).
    #[must_use]
    pub const fn assessable(&self) -> u64 {
        self.total() - self.not_applicable
    }
}

// ============================================================================
// SECTION: Score Functions
// ============================================================================

/// Default weighted score: `100 × (S + 0.5·P + 0.75·R) / D`.
///
/// When the denominator `D = total − not_applicable` is zero the score is
/// 100: an all-`not_applicable` scope is fully compliant.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Row counts are far below the f64 integer precision bound."
)]
pub fn weighted_score(tally: &StatusTally) -> f64 {
    let denominator = tally.assessable();
    if denominator == 0 {
        return 100.0;
    }
    let numerator = (tally.satisfied as f64)
        + 0.5 * (tally.partially_satisfied as f64)
        + 0.75 * (tally.risk_accepted as f64);
    100.0 * numerator / (denominator as f64)
}

/// CMMC variant: `100 × (met + 0.5·partially_met) / assessable`.
///
/// `met`/`partially_met` are the CMMC spellings of `satisfied` /
/// `partially_satisfied`; risk-accepted rows earn no credit here.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Row counts are far below the f64 integer precision bound."
)]
pub fn cmmc_score(tally: &StatusTally) -> f64 {
    let denominator = tally.assessable();
    if denominator == 0 {
        return 100.0;
    }
    let numerator = (tally.satisfied as f64) + 0.5 * (tally.partially_satisfied as f64);
    100.0 * numerator / (denominator as f64)
}

/// Area pass rate used by IV&V: `100 × (pass + 0.5·partial) / scoreable`.
#[must_use]
pub fn area_pass_rate(tally: &StatusTally) -> f64 {
    cmmc_score(tally)
}

/// IV&V overall score: `0.6 × verification + 0.4 × validation`.
///
/// Verification and validation inputs are unweighted means of their area
/// pass rates.
#[must_use]
pub const fn ivv_overall(verification: f64, validation: f64) -> f64 {
    0.6 * verification + 0.4 * validation
}

/// Unweighted mean of area scores, skipping areas with no rows.
///
/// Returns 100 when every area is empty (nothing scoreable exists).
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Area counts are far below the f64 integer precision bound."
)]
pub fn mean_of_populated(scores: &[(StatusTally, f64)]) -> f64 {
    let populated: Vec<f64> = scores
        .iter()
        .filter(|(tally, _)| tally.total() > 0)
        .map(|(_, score)| *score)
        .collect();
    if populated.is_empty() {
        return 100.0;
    }
    populated.iter().sum::<f64>() / (populated.len() as f64)
}

/// Rounds a score to one decimal place for display and persistence.
#[must_use]
pub fn round1(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

// ============================================================================
// SECTION: Grouping Roll-ups
// ============================================================================

/// Per-grouping score summary.
///
/// # Invariants
/// - `score` is computed by the framework's score function over `tally`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupScore {
    /// Per-status counts in this grouping.
    pub tally: StatusTally,
    /// Score for this grouping (one decimal place).
    pub score: f64,
}

/// Computes per-grouping scores from `(grouping, status)` pairs.
///
/// Groupings with no rows are omitted; the overall roll-up averages only
/// groupings whose total is greater than zero.
#[must_use]
pub fn grouping_scores<I>(
    rows: I,
    score_fn: fn(&StatusTally) -> f64,
) -> BTreeMap<String, GroupScore>
where
    I: IntoIterator<Item = (String, ControlStatus)>,
{
    let mut tallies: BTreeMap<String, StatusTally> = BTreeMap::new();
    for (grouping, status) in rows {
        tallies.entry(grouping).or_default().add(status);
    }
    tallies
        .into_iter()
        .map(|(grouping, tally)| {
            let score = round1(score_fn(&tally));
            (grouping, GroupScore { tally, score })
        })
        .collect()
}

/// Averages grouping scores over populated groupings.
///
/// Returns 0 when no grouping has rows (nothing was assessed at all).
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Grouping counts are far below the f64 integer precision bound."
)]
pub fn overall_from_groups(groups: &BTreeMap<String, GroupScore>) -> f64 {
    let populated: Vec<f64> = groups
        .values()
        .filter(|group| group.tally.total() > 0)
        .map(|group| group.score)
        .collect();
    if populated.is_empty() {
        return 0.0;
    }
    round1(populated.iter().sum::<f64>() / (populated.len() as f64))
}

// ============================================================================
// SECTION: Posture Labels
// ============================================================================

/// Security posture label derived from an overall score.
///
/// Thresholds: Strong ≥ 90, Moderate ≥ 70, Developing ≥ 50, else Weak.
#[must_use]
pub const fn posture_label(score: f64) -> &'static str {
    if score >= 90.0 {
        "Strong"
    } else if score >= 70.0 {
        "Moderate"
    } else if score >= 50.0 {
        "Developing"
    } else {
        "Weak"
    }
}

/// CMMC readiness label derived from an overall score.
///
/// Thresholds: Ready ≥ 90, Conditionally Ready ≥ 70, Partially Ready ≥ 50,
/// else Not Ready.
#[must_use]
pub const fn readiness_label(score: f64) -> &'static str {
    if score >= 90.0 {
        "Ready"
    } else if score >= 70.0 {
        "Conditionally Ready"
    } else if score >= 50.0 {
        "Partially Ready"
    } else {
        "Not Ready"
    }
}

#[cfg(test)]
mod tests;
