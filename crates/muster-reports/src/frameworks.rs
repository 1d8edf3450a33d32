// crates/muster-reports/src/frameworks.rs
// ============================================================================
// Module: Framework Report Definitions
// Description: Per-framework rendering metadata for the report generator.
// Purpose: Fix group orders, status vocabulary, and event types per framework.
// Dependencies: muster-core
// ============================================================================

//! ## Overview
//! The report generator is framework-agnostic; everything framework-specific
//! is data declared here: the grouping label used in headings, the display
//! status vocabulary, the fixed group ordering (14 CMMC domains, 20 NIST
//! control families, 9 IV&V areas), and the audit event type whose count
//! drives report versioning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use muster_core::FrameworkId;
use muster_core::StatusStyle;
use muster_core::scoring::GroupScore;

// ============================================================================
// SECTION: Group Orders
// ============================================================================

/// CMMC domain order (14 domains).
pub const CMMC_DOMAIN_ORDER: [&str; 14] = [
    "AC", "AT", "AU", "CM", "IA", "IR", "MA", "MP", "PS", "PE", "RA", "CA", "SC", "SI",
];

/// NIST 800-53 control family order (20 families).
pub const NIST_FAMILY_ORDER: [&str; 20] = [
    "AC", "AT", "AU", "CA", "CM", "CP", "IA", "IR", "MA", "MP", "PE", "PL", "PM", "PS", "PT",
    "RA", "SA", "SC", "SI", "SR",
];

/// IV&V area order (7 verification + 2 validation areas).
pub const IVV_AREA_ORDER: [&str; 9] = [
    "verification_requirements",
    "verification_design",
    "verification_code",
    "verification_integration",
    "verification_security",
    "verification_documentation",
    "verification_traceability",
    "validation_functional",
    "validation_operational",
];

// ============================================================================
// SECTION: Report Spec
// ============================================================================

/// Rendering metadata for one framework's reports.
///
/// # Invariants
/// - `report_event_type` is stable; report versions derive from its count.
#[derive(Debug, Clone, Copy)]
pub struct ReportSpec {
    /// Framework this spec renders.
    pub framework: FrameworkId,
    /// Heading label for the grouping dimension.
    pub grouping_label: &'static str,
    /// Display vocabulary for canonical statuses.
    pub status_style: StatusStyle,
    /// Fixed group ordering; groups not listed append alphabetically.
    pub group_order: &'static [&'static str],
    /// Audit event type recorded per generated report.
    pub report_event_type: &'static str,
}

/// Returns the report spec for a framework.
#[must_use]
pub const fn report_spec(framework: FrameworkId) -> ReportSpec {
    match framework {
        FrameworkId::Nist80053 => ReportSpec {
            framework,
            grouping_label: "Control Family",
            status_style: StatusStyle::Satisfied,
            group_order: &NIST_FAMILY_ORDER,
            report_event_type: "nist_800_53_report_generated",
        },
        FrameworkId::Fips => ReportSpec {
            framework,
            grouping_label: "Requirement Area",
            status_style: StatusStyle::Satisfied,
            group_order: &[],
            report_event_type: "fips_report_generated",
        },
        FrameworkId::Cmmc => ReportSpec {
            framework,
            grouping_label: "Domain",
            status_style: StatusStyle::Met,
            group_order: &CMMC_DOMAIN_ORDER,
            report_event_type: "cmmc_report_generated",
        },
        FrameworkId::Fedramp => ReportSpec {
            framework,
            grouping_label: "Control Family",
            status_style: StatusStyle::Satisfied,
            group_order: &NIST_FAMILY_ORDER,
            report_event_type: "fedramp_report_generated",
        },
        FrameworkId::Atlas => ReportSpec {
            framework,
            grouping_label: "Tactic Category",
            status_style: StatusStyle::Satisfied,
            group_order: &[],
            report_event_type: "atlas_report_generated",
        },
        FrameworkId::Sbd => ReportSpec {
            framework,
            grouping_label: "Commitment Area",
            status_style: StatusStyle::Satisfied,
            group_order: &[],
            report_event_type: "sbd_report_generated",
        },
        FrameworkId::Ivv => ReportSpec {
            framework,
            grouping_label: "Process Area",
            status_style: StatusStyle::Pass,
            group_order: &IVV_AREA_ORDER,
            report_event_type: "ivv_report_generated",
        },
        FrameworkId::Cssp => ReportSpec {
            framework,
            grouping_label: "Service Area",
            status_style: StatusStyle::Satisfied,
            group_order: &[],
            report_event_type: "cssp_report_generated",
        },
        FrameworkId::Zta => ReportSpec {
            framework,
            grouping_label: "Pillar",
            status_style: StatusStyle::Satisfied,
            group_order: &[],
            report_event_type: "zta_report_generated",
        },
    }
}

/// Orders grouping labels by the framework's fixed order, then alphabetically.
#[must_use]
pub fn ordered_groups(spec: &ReportSpec, groups: &BTreeMap<String, GroupScore>) -> Vec<String> {
    let mut ordered: Vec<String> = spec
        .group_order
        .iter()
        .filter(|name| groups.contains_key(**name))
        .map(|name| (*name).to_string())
        .collect();
    for name in groups.keys() {
        if !ordered.iter().any(|existing| existing == name) {
            ordered.push(name.clone());
        }
    }
    ordered
}
