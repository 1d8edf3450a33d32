// crates/muster-reports/src/stig_report.rs
// ============================================================================
// Module: STIG Checklist Report
// Description: CUI-marked STIG checklist rendered from stored findings.
// Purpose: Produce the checklist document and security gate section.
// Dependencies: muster-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The checklist report reads the project's stored findings, tallies them
//! per severity and status, evaluates the CAT1 gate, and renders the
//! checklist with per-finding detail sections. Versioning follows the same
//! audit-count rule as the framework reports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::Finding;
use muster_core::FindingStatus;
use muster_core::GateResult;
use muster_core::ProjectId;
use muster_core::StigSeverity;
use muster_core::StoreError;
use muster_core::Timestamp;
use muster_core::gates;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::cui::CuiConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Audit event type recorded per generated checklist.
const STIG_REPORT_EVENT: &str = "stig_report_generated";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// STIG checklist generation errors.
#[derive(Debug, Error)]
pub enum StigReportError {
    /// Project does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage failure.
    #[error("store error: {0}")]
    Store(StoreError),
    /// Output file I/O failure.
    #[error("stig report io error: {0}")]
    Io(String),
}

impl From<StoreError> for StigReportError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Result of one checklist generation run.
#[derive(Debug, Clone, Serialize)]
pub struct StigChecklistOutput {
    /// Outcome label (`success`).
    pub status: String,
    /// Written checklist path.
    pub output_file: PathBuf,
    /// Checklist version label (`{n}.0`).
    pub version: String,
    /// Rendered checklist text.
    pub markdown: String,
    /// Security gate result.
    pub gate_result: GateResult,
    /// Count of CAT1 findings in `Open`.
    pub cat1_open: u64,
    /// Non-fatal warnings surfaced to the caller's diagnostics stream.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Generates the CUI-marked STIG checklist for a project.
///
/// # Errors
///
/// Returns [`StigReportError::NotFound`] when the project does not exist
/// and [`StigReportError::Io`]/[`StigReportError::Store`] on output or
/// storage failures.
pub fn generate_stig_checklist<S: ComplianceStore>(
    store: &S,
    project_id: &ProjectId,
    cui: &CuiConfig,
    output_path: Option<&Path>,
    fallback_dir: &Path,
    now: Timestamp,
) -> Result<StigChecklistOutput, StigReportError> {
    let project = store.load_project(project_id)?;
    let findings = store.load_findings(project_id)?;

    let mut counts: BTreeMap<&'static str, BTreeMap<&'static str, u64>> = BTreeMap::new();
    for severity in StigSeverity::ALL {
        counts.insert(severity.as_str(), BTreeMap::new());
    }
    for finding in &findings {
        let per_status = counts.entry(finding.severity.as_str()).or_default();
        *per_status.entry(finding.status.as_str()).or_insert(0) += 1;
    }
    let cat1_open = counts
        .get(StigSeverity::Cat1.as_str())
        .and_then(|per_status| per_status.get(FindingStatus::Open.as_str()))
        .copied()
        .unwrap_or(0);
    let gate_result = gates::stig_gate(cat1_open);

    let prior = store.count_audit_events(project_id, STIG_REPORT_EVENT)?;
    let version = format!("{}.0", prior + 1);

    let markdown = cui.apply(&render_checklist(
        &project.name,
        project_id,
        &findings,
        &counts,
        &gate_result,
        cat1_open,
        &version,
        now,
    ));

    let output_file = output_path.map_or_else(
        || {
            let filename = format!("stig-webapp-checklist-v{version}.md");
            project.directory_path.as_ref().map_or_else(
                || fallback_dir.join(project_id.as_str()).join("compliance").join(&filename),
                |dir| dir.join("compliance").join(&filename),
            )
        },
        Path::to_path_buf,
    );
    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| StigReportError::Io(format!("{}: {err}", parent.display())))?;
    }
    std::fs::write(&output_file, &markdown)
        .map_err(|err| StigReportError::Io(format!("{}: {err}", output_file.display())))?;

    let mut warnings = Vec::new();
    let event = AuditEvent::new(
        project_id.clone(),
        STIG_REPORT_EVENT,
        format!("STIG checklist v{version} generated, gate {}", gate_result.result_label()),
        json!({
            "version": version,
            "cat1_open": cat1_open,
            "gate_result": gate_result.result_label(),
            "output_file": output_file.display().to_string(),
        }),
        now,
    )
    .with_affected_file(output_file.display().to_string());
    if let Err(error) = store.append_audit(&event) {
        warnings.push(format!("audit event not recorded: {error}"));
    }

    Ok(StigChecklistOutput {
        status: "success".to_string(),
        output_file,
        version,
        markdown,
        gate_result,
        cat1_open,
        warnings,
    })
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the checklist body (before CUI marking).
#[allow(
    clippy::too_many_arguments,
    reason = "Section rendering consumes every computed artifact once."
)]
fn render_checklist(
    project_name: &str,
    project_id: &ProjectId,
    findings: &[Finding],
    counts: &BTreeMap<&'static str, BTreeMap<&'static str, u64>>,
    gate_result: &GateResult,
    cat1_open: u64,
    version: &str,
    now: Timestamp,
) -> String {
    let mut lines = vec![
        "# STIG Checklist: Web Application Security".to_string(),
        String::new(),
        format!("**Project:** {project_name} ({project_id})"),
        "**STIG ID:** webapp".to_string(),
        format!("**Checklist Version:** {version}"),
        format!("**Assessment Date:** {}", now.as_utc_display()),
        "**Assessed By:** Muster STIG Checker (automated)".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
        "## Summary".to_string(),
        String::new(),
        "| Severity | Open | Not A Finding | Not Applicable | Not Reviewed | Total |".to_string(),
        "|----------|-----:|--------------:|---------------:|-------------:|------:|".to_string(),
    ];
    for severity in StigSeverity::ALL {
        let per_status = counts.get(severity.as_str());
        let get = |status: FindingStatus| -> u64 {
            per_status.and_then(|map| map.get(status.as_str())).copied().unwrap_or(0)
        };
        let open = get(FindingStatus::Open);
        let naf = get(FindingStatus::NotAFinding);
        let na = get(FindingStatus::NotApplicable);
        let nr = get(FindingStatus::NotReviewed);
        lines.push(format!(
            "| {} | {open} | {naf} | {na} | {nr} | {} |",
            severity.as_str(),
            open + naf + na + nr
        ));
    }
    lines.extend([
        String::new(),
        "## Security Gate Evaluation".to_string(),
        String::new(),
        format!("**Gate Result:** **{}**", gate_result.result_label()),
        format!("**Criteria:** {}", gate_result.criteria),
        format!("**CAT1 Open:** {cat1_open}"),
        String::new(),
        "---".to_string(),
        String::new(),
        "## Findings".to_string(),
        String::new(),
    ]);
    if findings.is_empty() {
        lines.push("*No findings recorded. Run the STIG checker first.*".to_string());
    }
    for finding in findings {
        lines.extend([
            format!("### {} - {}", finding.finding_id, finding.title),
            String::new(),
            format!("**Rule:** {}", finding.rule_id),
            format!("**Severity:** {}", finding.severity),
            format!("**Status:** {}", finding.status),
            format!("**Comments:** {}", finding.evidence),
            format!("**Fix:** {}", finding.fix_text),
            String::new(),
        ]);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests;
