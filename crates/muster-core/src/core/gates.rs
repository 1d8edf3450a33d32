// crates/muster-core/src/core/gates.rs
// ============================================================================
// Module: Gate Evaluation
// Description: Deterministic pass/fail gates derived from assessment state.
// Purpose: Compute deployment-blocking gates from stored rows and catalogs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A gate is a boolean pass/fail derived from an assessment set, used to
//! block deployment. Gate failures are results, never errors: callers render
//! the detail and map the outcome to an exit code only when explicitly asked
//! to (`--gate`). Every gate here is a pure function of stored rows, finding
//! counts, and catalog priorities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::scoring::GroupScore;
use crate::core::scoring::StatusTally;
use crate::core::status::ControlStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// FedRAMP key controls that must carry no `other_than_satisfied` status.
pub const FEDRAMP_KEY_CONTROLS: [&str; 5] = ["AC-2", "IA-2", "SC-7", "AU-2", "CM-6"];

/// FedRAMP major control families that each need at least one assessed row.
pub const FEDRAMP_MAJOR_FAMILIES: [&str; 8] =
    ["AC", "AU", "CM", "IA", "SC", "SA", "RA", "CA"];

/// Minimum overall score for the FedRAMP gate.
const FEDRAMP_MIN_SCORE: f64 = 80.0;

/// Minimum coverage percentage for the ATLAS gate.
const ATLAS_MIN_COVERAGE: f64 = 80.0;

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Outcome of one gate evaluation.
///
/// # Invariants
/// - `passed` is derivable from `detail`; both are kept for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Stable gate name (e.g. `cmmc_certification`).
    pub gate: String,
    /// Human-readable pass criteria.
    pub criteria: String,
    /// Whether the gate passed.
    pub passed: bool,
    /// Evaluation detail for reports.
    pub detail: String,
}

impl GateResult {
    /// Returns `PASS` or `FAIL` for report rendering.
    #[must_use]
    pub const fn result_label(&self) -> &'static str {
        if self.passed { "PASS" } else { "FAIL" }
    }
}

// ============================================================================
// SECTION: Gate Functions
// ============================================================================

/// STIG gate: passes iff no CAT1 finding is `Open`.
#[must_use]
pub fn stig_gate(cat1_open: u64) -> GateResult {
    let passed = cat1_open == 0;
    GateResult {
        gate: "stig_security".to_string(),
        criteria: "0 CAT1 findings Open".to_string(),
        passed,
        detail: if passed {
            "PASS: 0 CAT1 findings Open".to_string()
        } else {
            format!("FAIL: {cat1_open} CAT1 finding(s) Open")
        },
    }
}

/// CMMC gate: passes iff no practice at the target level is `not_met`.
#[must_use]
pub fn cmmc_gate(tally: &StatusTally) -> GateResult {
    let not_met = tally.not_satisfied;
    let passed = not_met == 0;
    GateResult {
        gate: "cmmc_certification".to_string(),
        criteria: "0 practices not_met at target level".to_string(),
        passed,
        detail: if passed {
            "PASS: all assessed practices met or better".to_string()
        } else {
            format!("FAIL: {not_met} practice(s) not_met")
        },
    }
}

/// FedRAMP gate: key controls clean, score ≥ 80, major families covered.
///
/// Criteria: zero `other_than_satisfied` on the key controls, overall score
/// at or above the threshold, and every major family carrying at least one
/// assessed row.
#[must_use]
pub fn fedramp_gate(
    statuses_by_id: &BTreeMap<String, ControlStatus>,
    groups: &BTreeMap<String, GroupScore>,
    overall_score: f64,
) -> GateResult {
    let mut failures = Vec::new();
    for control in FEDRAMP_KEY_CONTROLS {
        if statuses_by_id.get(control) == Some(&ControlStatus::NotSatisfied) {
            failures.push(format!("{control} is other_than_satisfied"));
        }
    }
    if overall_score < FEDRAMP_MIN_SCORE {
        failures.push(format!(
            "overall score {overall_score:.1} below {FEDRAMP_MIN_SCORE:.0}"
        ));
    }
    for family in FEDRAMP_MAJOR_FAMILIES {
        let assessed = groups
            .get(family)
            .map(|group| group.tally.total() - group.tally.not_assessed)
            .unwrap_or(0);
        if assessed == 0 {
            failures.push(format!("family {family} has no assessed controls"));
        }
    }
    let passed = failures.is_empty();
    GateResult {
        gate: "fedramp_authorization".to_string(),
        criteria: format!(
            "key controls satisfied, score >= {FEDRAMP_MIN_SCORE:.0}, major families assessed"
        ),
        passed,
        detail: if passed {
            "PASS: key controls clean, score and coverage thresholds met".to_string()
        } else {
            format!("FAIL: {}", failures.join("; "))
        },
    }
}

/// Secure-by-Design gate: passes iff no critical requirement is `not_satisfied`.
#[must_use]
pub fn sbd_gate(critical_not_satisfied: u64) -> GateResult {
    let passed = critical_not_satisfied == 0;
    GateResult {
        gate: "sbd_commitments".to_string(),
        criteria: "0 critical-priority requirements not_satisfied".to_string(),
        passed,
        detail: if passed {
            "PASS: no critical commitments unsatisfied".to_string()
        } else {
            format!("FAIL: {critical_not_satisfied} critical requirement(s) not_satisfied")
        },
    }
}

/// IV&V gate: passes iff no critical finding is open or in progress.
#[must_use]
pub fn ivv_gate(critical_open: u64) -> GateResult {
    let passed = critical_open == 0;
    GateResult {
        gate: "ivv_findings".to_string(),
        criteria: "0 critical findings open or in_progress".to_string(),
        passed,
        detail: if passed {
            "PASS: no critical findings outstanding".to_string()
        } else {
            format!("FAIL: {critical_open} critical finding(s) outstanding")
        },
    }
}

/// ATLAS gate: zero `not_satisfied` and coverage at or above 80 percent.
///
/// Coverage = percentage of assessable mitigations that have been assessed
/// (`100 × (assessable − not_assessed) / assessable`; 100 when nothing is
/// assessable).
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "Row counts are far below the f64 integer precision bound."
)]
pub fn atlas_gate(tally: &StatusTally) -> GateResult {
    let assessable = tally.assessable();
    let coverage = if assessable == 0 {
        100.0
    } else {
        100.0 * ((assessable - tally.not_assessed) as f64) / (assessable as f64)
    };
    let mut failures = Vec::new();
    if tally.not_satisfied > 0 {
        failures.push(format!("{} mitigation(s) not_satisfied", tally.not_satisfied));
    }
    if coverage < ATLAS_MIN_COVERAGE {
        failures.push(format!("coverage {coverage:.1} below {ATLAS_MIN_COVERAGE:.0}"));
    }
    let passed = failures.is_empty();
    GateResult {
        gate: "atlas_mitigations".to_string(),
        criteria: format!("0 not_satisfied and coverage >= {ATLAS_MIN_COVERAGE:.0}"),
        passed,
        detail: if passed {
            format!("PASS: coverage {coverage:.1}, no unsatisfied mitigations")
        } else {
            format!("FAIL: {}", failures.join("; "))
        },
    }
}

/// Generic critical-priority gate used by frameworks without a bespoke gate.
///
/// Passes iff no critical-priority requirement is `not_satisfied`; used for
/// NIST 800-53, FIPS, CSSP, and ZTA assessments.
#[must_use]
pub fn critical_priority_gate(gate_name: &str, critical_not_satisfied: u64) -> GateResult {
    let passed = critical_not_satisfied == 0;
    GateResult {
        gate: gate_name.to_string(),
        criteria: "0 critical-priority requirements not_satisfied".to_string(),
        passed,
        detail: if passed {
            "PASS: no critical requirements unsatisfied".to_string()
        } else {
            format!("FAIL: {critical_not_satisfied} critical requirement(s) not_satisfied")
        },
    }
}
