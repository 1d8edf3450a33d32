// crates/muster-core/src/core/status.rs
// ============================================================================
// Module: Muster Status Model
// Description: Canonical assessment statuses and per-framework display forms.
// Purpose: Map heterogeneous framework status names onto one storage enum.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Different frameworks name their statuses differently (`satisfied` vs
//! `met` vs `pass`). Muster maps all of them onto a single canonical
//! [`ControlStatus`] at the storage boundary and keeps the framework-specific
//! spellings as display tables used only for report rendering. Parsing
//! accepts every known synonym; storage always writes the canonical label.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Control Status
// ============================================================================

/// Canonical assessment status stored for every requirement row.
///
/// # Invariants
/// - Wire labels are stable snake_case strings.
/// - [`ControlStatus::NotApplicable`] rows are excluded from score denominators;
///   every other status is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    /// Requirement fully satisfied.
    Satisfied,
    /// Requirement partially satisfied.
    PartiallySatisfied,
    /// Requirement not satisfied.
    NotSatisfied,
    /// Requirement does not apply to this project.
    NotApplicable,
    /// Requirement has not been assessed yet.
    NotAssessed,
    /// Requirement unmet but the residual risk was formally accepted.
    RiskAccepted,
}

impl ControlStatus {
    /// All canonical statuses in storage order.
    pub const ALL: [Self; 6] = [
        Self::Satisfied,
        Self::PartiallySatisfied,
        Self::NotSatisfied,
        Self::NotApplicable,
        Self::NotAssessed,
        Self::RiskAccepted,
    ];

    /// Returns the canonical storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Satisfied => "satisfied",
            Self::PartiallySatisfied => "partially_satisfied",
            Self::NotSatisfied => "not_satisfied",
            Self::NotApplicable => "not_applicable",
            Self::NotAssessed => "not_assessed",
            Self::RiskAccepted => "risk_accepted",
        }
    }

    /// Parses a status label, accepting every known framework synonym.
    ///
    /// Recognized synonym families: `met`/`not_met`/`partially_met` (CMMC),
    /// `pass`/`fail`/`partial` (IV&V), and `other_than_satisfied` (FedRAMP).
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "satisfied" | "met" | "pass" | "implemented" => Some(Self::Satisfied),
            "partially_satisfied" | "partially_met" | "partial" | "partially_implemented" => {
                Some(Self::PartiallySatisfied)
            }
            "not_satisfied" | "not_met" | "fail" | "other_than_satisfied" => {
                Some(Self::NotSatisfied)
            }
            "not_applicable" | "na" | "n/a" => Some(Self::NotApplicable),
            "not_assessed" | "not_reviewed" | "unassessed" => Some(Self::NotAssessed),
            "risk_accepted" | "accepted_risk" => Some(Self::RiskAccepted),
            _ => None,
        }
    }

    /// Renders the status in a framework display style for report tables.
    #[must_use]
    pub const fn display_label(self, style: StatusStyle) -> &'static str {
        match style {
            StatusStyle::Satisfied => self.as_str(),
            StatusStyle::Met => match self {
                Self::Satisfied => "met",
                Self::PartiallySatisfied => "partially_met",
                Self::NotSatisfied => "not_met",
                Self::NotApplicable => "not_applicable",
                Self::NotAssessed => "not_assessed",
                Self::RiskAccepted => "risk_accepted",
            },
            StatusStyle::Pass => match self {
                Self::Satisfied => "pass",
                Self::PartiallySatisfied => "partial",
                Self::NotSatisfied => "fail",
                Self::NotApplicable => "not_applicable",
                Self::NotAssessed => "not_assessed",
                Self::RiskAccepted => "risk_accepted",
            },
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display style for rendering canonical statuses in reports.
///
/// # Invariants
/// - Styles affect rendering only; storage always uses canonical labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStyle {
    /// `satisfied` / `not_satisfied` family (NIST, FedRAMP, ATLAS, SbD).
    Satisfied,
    /// `met` / `not_met` family (CMMC).
    Met,
    /// `pass` / `fail` family (IV&V).
    Pass,
}

// ============================================================================
// SECTION: Finding Status
// ============================================================================

/// Status of a derived finding (STIG, IV&V, vulnerability).
///
/// # Invariants
/// - Wire labels match the checklist vocabulary used by STIG tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingStatus {
    /// Finding is open and unresolved.
    #[serde(rename = "Open")]
    Open,
    /// Check ran and found no weakness.
    #[serde(rename = "NotAFinding")]
    NotAFinding,
    /// Check does not apply to this project.
    #[serde(rename = "Not_Applicable")]
    NotApplicable,
    /// Check requires manual review before a verdict.
    #[serde(rename = "Not_Reviewed")]
    NotReviewed,
    /// Finding was remediated.
    #[serde(rename = "resolved")]
    Resolved,
    /// Residual risk was formally accepted.
    #[serde(rename = "accepted_risk")]
    AcceptedRisk,
    /// Remediation deferred to a later milestone.
    #[serde(rename = "deferred")]
    Deferred,
}

impl FindingStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::NotAFinding => "NotAFinding",
            Self::NotApplicable => "Not_Applicable",
            Self::NotReviewed => "Not_Reviewed",
            Self::Resolved => "resolved",
            Self::AcceptedRisk => "accepted_risk",
            Self::Deferred => "deferred",
        }
    }

    /// Parses a wire label into a finding status.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Open" | "open" => Some(Self::Open),
            "NotAFinding" => Some(Self::NotAFinding),
            "Not_Applicable" => Some(Self::NotApplicable),
            "Not_Reviewed" => Some(Self::NotReviewed),
            "resolved" => Some(Self::Resolved),
            "accepted_risk" => Some(Self::AcceptedRisk),
            "deferred" => Some(Self::Deferred),
            _ => None,
        }
    }
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Severity
// ============================================================================

/// STIG finding severity category.
///
/// # Invariants
/// - CAT1 is the most severe; the STIG gate fails on any CAT1 `Open` finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StigSeverity {
    /// Category I: direct and immediate loss of confidentiality or integrity.
    #[serde(rename = "CAT1")]
    Cat1,
    /// Category II: potential loss if not mitigated.
    #[serde(rename = "CAT2")]
    Cat2,
    /// Category III: degrades protections.
    #[serde(rename = "CAT3")]
    Cat3,
}

impl StigSeverity {
    /// All severities from most to least severe.
    pub const ALL: [Self; 3] = [Self::Cat1, Self::Cat2, Self::Cat3];

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cat1 => "CAT1",
            Self::Cat2 => "CAT2",
            Self::Cat3 => "CAT3",
        }
    }

    /// Parses a wire label into a severity.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim() {
            "CAT1" | "cat1" => Some(Self::Cat1),
            "CAT2" | "cat2" => Some(Self::Cat2),
            "CAT3" | "cat3" => Some(Self::Cat3),
            _ => None,
        }
    }
}

impl fmt::Display for StigSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Priority
// ============================================================================

/// Catalog requirement priority.
///
/// # Invariants
/// - Ordering is most-critical-first for remediation plan sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Must be remediated immediately.
    Critical,
    /// High remediation priority.
    High,
    /// Medium remediation priority.
    Medium,
    /// Low remediation priority.
    Low,
}

impl Priority {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a wire label, defaulting unknown labels to `None`.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Returns the remediation window in days for this priority.
    ///
    /// Windows: critical = 14 days, high = 30, medium = 60, low = 90.
    #[must_use]
    pub const fn remediation_window_days(self) -> i64 {
        match self {
            Self::Critical => 14,
            Self::High => 30,
            Self::Medium => 60,
            Self::Low => 90,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Automation Level
// ============================================================================

/// How much of a requirement's assessment can be automated.
///
/// # Invariants
/// - Wire labels are stable snake_case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationLevel {
    /// Fully automatable deterministic check.
    Auto,
    /// Partially automatable; needs human confirmation.
    Semi,
    /// Manual assessment only.
    Manual,
}

impl AutomationLevel {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Semi => "semi",
            Self::Manual => "manual",
        }
    }

    /// Parses a wire label into an automation level.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "auto" | "automated" => Some(Self::Auto),
            "semi" | "semi_automated" => Some(Self::Semi),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}
