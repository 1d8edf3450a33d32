// crates/muster-reports/src/generator.rs
// ============================================================================
// Module: Report Generator Base
// Description: CUI-marked Markdown reports from persisted assessment rows.
// Purpose: Render deterministic framework reports with audit-count versioning.
// Dependencies: muster-core, muster-frameworks, serde, serde_json
// ============================================================================

//! ## Overview
//! The generator follows a strict order: load rows, load catalog, recompute
//! the summary from storage, derive the version from the audit-event count,
//! build section bodies, substitute `{{variable}}` placeholders into the
//! template, apply CUI markings, write the file, and append one audit
//! event. The same persisted rows always produce byte-identical output
//! (modulo the caller-supplied timestamp).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use muster_core::AssessmentRow;
use muster_core::AuditEvent;
use muster_core::Catalog;
use muster_core::CatalogError;
use muster_core::ComplianceStore;
use muster_core::ControlStatus;
use muster_core::FrameworkId;
use muster_core::Priority;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::StoreError;
use muster_core::Timestamp;
use muster_core::scoring;
use muster_frameworks::AssessmentSummary;
use muster_frameworks::assessor::AssessError;
use muster_frameworks::engine_for;
use muster_frameworks::summarize_rows;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::cui::CuiConfig;
use crate::frameworks::ReportSpec;
use crate::frameworks::ordered_groups;
use crate::frameworks::report_spec;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report generation errors.
///
/// # Invariants
/// - Gate failures are never errors; they render into the report body.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Project or referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Catalog file missing or malformed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Storage failure.
    #[error("store error: {0}")]
    Store(StoreError),
    /// Template or output file I/O failure.
    #[error("report io error: {0}")]
    Io(String),
}

impl From<StoreError> for ReportError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Store(other),
        }
    }
}

impl From<AssessError> for ReportError {
    fn from(error: AssessError) -> Self {
        match error {
            AssessError::NotFound(message) => Self::NotFound(message),
            AssessError::Catalog(error) => Self::Catalog(error),
            AssessError::Store(error) => Self::Store(error),
        }
    }
}

// ============================================================================
// SECTION: Options and Output
// ============================================================================

/// Inputs for one report generation run.
///
/// # Invariants
/// - `now` is the only time source; the generator never reads the clock.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions<'a> {
    /// Framework to report on.
    pub framework: FrameworkId,
    /// Project to report on.
    pub project_id: &'a ProjectId,
    /// Directory holding catalog documents.
    pub catalog_dir: &'a Path,
    /// CUI marking configuration.
    pub cui: &'a CuiConfig,
    /// Optional template file overriding the built-in template.
    pub template_path: Option<&'a Path>,
    /// Optional explicit output path.
    pub output_path: Option<&'a Path>,
    /// Output root used when the project has no directory.
    pub fallback_dir: &'a Path,
    /// Report timestamp supplied by the caller.
    pub now: Timestamp,
}

/// Result of one report generation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    /// Outcome label (`success`).
    pub status: String,
    /// Written report path.
    pub output_file: PathBuf,
    /// Report version label (`{n}.0`).
    pub version: String,
    /// Rendered report text.
    pub markdown: String,
    /// Summary recomputed from the persisted rows.
    pub summary: AssessmentSummary,
    /// Non-fatal warnings surfaced to the caller's diagnostics stream.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Generates a CUI-marked Markdown report for one `(project, framework)`.
///
/// # Errors
///
/// Returns [`ReportError::NotFound`] when the project does not exist,
/// [`ReportError::Catalog`] when the catalog is missing or malformed, and
/// [`ReportError::Io`]/[`ReportError::Store`] on template, output, or
/// storage failures.
pub fn generate_report<S: ComplianceStore>(
    store: &S,
    options: &ReportOptions<'_>,
) -> Result<ReportOutput, ReportError> {
    let spec = report_spec(options.framework);
    let project = store.load_project(options.project_id)?;
    let rows = store.load_assessments(options.framework, options.project_id)?;
    let catalog = load_catalog(options.catalog_dir, options.framework)?;
    let mut summary =
        summarize_rows(store, options.framework, options.project_id, &catalog, &rows, Vec::new())?;

    let prior = store.count_audit_events(options.project_id, spec.report_event_type)?;
    let version = format!("{}.0", prior + 1);

    let variables = build_variables(&spec, &project, &rows, &catalog, &summary, &version, options);
    let template = load_template(options.template_path)?;
    let rendered = substitute(&template, &variables);
    let markdown = options.cui.apply(&rendered);

    let output_file = resolve_output_path(&spec, &project, &version, options);
    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| ReportError::Io(format!("{}: {err}", parent.display())))?;
    }
    std::fs::write(&output_file, &markdown)
        .map_err(|err| ReportError::Io(format!("{}: {err}", output_file.display())))?;

    let event = AuditEvent::new(
        options.project_id.clone(),
        spec.report_event_type,
        format!(
            "{} report v{version} generated, score {:.1}, gate {}",
            options.framework.display_name(),
            summary.overall_score,
            summary.gate_result.result_label()
        ),
        json!({
            "version": version,
            "overall_score": summary.overall_score,
            "gate_result": summary.gate_result.result_label(),
            "output_file": output_file.display().to_string(),
            "status_counts": summary.status_counts,
        }),
        options.now,
    )
    .with_affected_file(output_file.display().to_string());
    if let Err(error) = store.append_audit(&event) {
        summary.warnings.push(format!("audit event not recorded: {error}"));
    }

    let warnings = summary.warnings.clone();
    Ok(ReportOutput {
        status: "success".to_string(),
        output_file,
        version,
        markdown,
        summary,
        warnings,
    })
}

/// Loads the catalog document for a framework.
fn load_catalog(catalog_dir: &Path, framework: FrameworkId) -> Result<Catalog, ReportError> {
    let filename = engine_for(framework).catalog_filename();
    let path = catalog_dir.join(filename);
    let text = std::fs::read_to_string(&path)
        .map_err(|err| ReportError::Catalog(CatalogError::Io(format!("{}: {err}", path.display()))))?;
    Ok(Catalog::from_text(&text)?)
}

/// Loads the template text from disk or the built-in fallback.
fn load_template(template_path: Option<&Path>) -> Result<String, ReportError> {
    match template_path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| ReportError::Io(format!("{}: {err}", path.display()))),
        None => Ok(BUILTIN_TEMPLATE.to_string()),
    }
}

/// Resolves the output file path for the rendered report.
fn resolve_output_path(
    spec: &ReportSpec,
    project: &Project,
    version: &str,
    options: &ReportOptions<'_>,
) -> PathBuf {
    if let Some(path) = options.output_path {
        return path.to_path_buf();
    }
    let filename = format!("{}-report-v{version}.md", spec.framework.as_str());
    match &project.directory_path {
        Some(dir) => dir.join("compliance").join(filename),
        None => options
            .fallback_dir
            .join(project.id.as_str())
            .join("compliance")
            .join(filename),
    }
}

// ============================================================================
// SECTION: Template
// ============================================================================

/// Built-in report template used when no template file is supplied.
const BUILTIN_TEMPLATE: &str = "\
# {{framework_name}} Assessment Report

**Project:** {{project_name}} ({{project_id}})
**Classification:** {{classification}}
**Impact Level:** {{impact_level}}
**Assessment Date:** {{assessment_date}}
**Report Version:** {{version}}
**Assessor:** {{assessor}}
**Overall Score:** {{overall_score}}%
**Posture:** {{posture}}
**Gate Result:** {{gate_result}}

---

## Executive Summary

{{executive_summary}}

---

## Coverage by {{grouping_label}}

{{grouping_table}}

---

## Detailed Assessment Results

{{detail_table}}

---

## Gap Analysis

{{gap_analysis}}

---

## Remediation Plan

{{remediation_plan}}

---

## NIST 800-53 Cross-Reference

{{nist_crossref}}

---

## Evidence Index

{{evidence_index}}

---

## Security Gate Evaluation

{{gate_details}}

---

*Generated by Muster Report Generator on {{assessment_date}}*
";

/// Replaces every known `{{variable}}` occurrence; unknown variables pass
/// through unchanged.
#[must_use]
pub fn substitute(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (name, value) in variables {
        rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
    }
    rendered
}

// ============================================================================
// SECTION: Variables
// ============================================================================

/// Builds the full substitution map for one report.
fn build_variables(
    spec: &ReportSpec,
    project: &Project,
    rows: &[AssessmentRow],
    catalog: &Catalog,
    summary: &AssessmentSummary,
    version: &str,
    options: &ReportOptions<'_>,
) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();
    let mut set = |name: &str, value: String| {
        variables.insert(name.to_string(), value);
    };
    set("framework_name", spec.framework.display_name().to_string());
    set("project_id", project.id.to_string());
    set("project_name", project.name.clone());
    set("classification", project.classification_label().to_string());
    set("impact_level", project.impact_level.to_string());
    set("assessment_date", options.now.as_utc_display());
    set("version", version.to_string());
    set("assessor", "muster-compliance-engine".to_string());
    set("overall_score", format!("{:.1}", summary.overall_score));
    set("posture", scoring::posture_label(summary.overall_score).to_string());
    set("gate_result", summary.gate_result.result_label().to_string());
    set("grouping_label", spec.grouping_label.to_string());
    set("executive_summary", executive_summary(spec, project, rows, summary));
    set("grouping_table", grouping_table(spec, summary));
    set("detail_table", detail_table(spec, rows, catalog));
    set("gap_analysis", gap_analysis(rows, catalog));
    set("remediation_plan", remediation_plan(rows, catalog, options.now));
    set("nist_crossref", nist_crossref(rows, catalog));
    set("evidence_index", evidence_index(rows));
    set("gate_details", gate_details(summary));
    set("cui_banner_top", options.cui.banner_top.clone());
    set("cui_banner_bottom", options.cui.banner_bottom.clone());
    variables
}

// ============================================================================
// SECTION: Section Builders
// ============================================================================

/// Builds the executive summary prose.
fn executive_summary(
    spec: &ReportSpec,
    project: &Project,
    rows: &[AssessmentRow],
    summary: &AssessmentSummary,
) -> String {
    if rows.is_empty() {
        return format!(
            "No {} assessment rows exist for {}. Run the assessor first, then regenerate \
             this report.",
            spec.framework.display_name(),
            project.name
        );
    }
    format!(
        "The {} assessment of {} covers {} requirements across {} {}s. The overall score \
         is **{:.1}%** ({}) with a gate result of **{}**. {} requirement(s) are not \
         satisfied and {} remain unassessed.",
        spec.framework.display_name(),
        project.name,
        summary.total_requirements,
        summary.group_scores.len(),
        spec.grouping_label.to_lowercase(),
        summary.overall_score,
        scoring::posture_label(summary.overall_score),
        summary.gate_result.result_label(),
        summary.status_counts.not_satisfied,
        summary.status_counts.not_assessed
    )
}

/// Builds the per-grouping score table.
fn grouping_table(spec: &ReportSpec, summary: &AssessmentSummary) -> String {
    if summary.group_scores.is_empty() {
        return "*No assessed groupings.*".to_string();
    }
    let mut lines = vec![
        format!(
            "| {} | Score | Total | Satisfied | Partial | Not Satisfied | N/A | Not Assessed |",
            spec.grouping_label
        ),
        "|---|------:|------:|----------:|--------:|--------------:|----:|-------------:|"
            .to_string(),
    ];
    for name in ordered_groups(spec, &summary.group_scores) {
        if let Some(group) = summary.group_scores.get(&name) {
            lines.push(format!(
                "| {} | {:.1}% | {} | {} | {} | {} | {} | {} |",
                name,
                group.score,
                group.tally.total(),
                group.tally.satisfied,
                group.tally.partially_satisfied,
                group.tally.not_satisfied,
                group.tally.not_applicable,
                group.tally.not_assessed
            ));
        }
    }
    lines.join("\n")
}

/// Builds the per-requirement detail table ordered by requirement id.
fn detail_table(spec: &ReportSpec, rows: &[AssessmentRow], catalog: &Catalog) -> String {
    if rows.is_empty() {
        return "*No assessment rows.*".to_string();
    }
    let mut lines = vec![
        "| Requirement | Title | Status | Evidence |".to_string(),
        "|-------------|-------|--------|----------|".to_string(),
    ];
    for row in rows {
        let title = catalog
            .requirement(&row.requirement_id)
            .map_or("(not in catalog)", |req| req.title.as_str());
        lines.push(format!(
            "| {} | {} | {} | {} |",
            row.requirement_id,
            truncate(title, 60),
            row.status.display_label(spec.status_style),
            truncate(&row.evidence_description, 60)
        ));
    }
    lines.join("\n")
}

/// Builds the gap analysis table over unsatisfied and unassessed rows.
fn gap_analysis(rows: &[AssessmentRow], catalog: &Catalog) -> String {
    let gaps: Vec<&AssessmentRow> = rows
        .iter()
        .filter(|row| {
            matches!(row.status, ControlStatus::NotSatisfied | ControlStatus::NotAssessed)
        })
        .collect();
    if gaps.is_empty() {
        return "*No gaps: every requirement is satisfied, not applicable, or risk accepted.*"
            .to_string();
    }
    let mut lines = vec![
        "| Requirement | Title | Grouping | Status | Priority |".to_string(),
        "|-------------|-------|----------|--------|----------|".to_string(),
    ];
    for row in gaps {
        let (title, grouping, priority) = catalog.requirement(&row.requirement_id).map_or(
            ("(not in catalog)", "general", Priority::Medium),
            |req| (req.title.as_str(), req.grouping.as_str(), req.priority),
        );
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.requirement_id,
            truncate(title, 50),
            grouping,
            row.status,
            priority
        ));
    }
    lines.join("\n")
}

/// Builds the remediation plan with priority-window target dates.
fn remediation_plan(rows: &[AssessmentRow], catalog: &Catalog, now: Timestamp) -> String {
    let mut gaps: Vec<(&AssessmentRow, Priority, &str)> = rows
        .iter()
        .filter(|row| {
            matches!(row.status, ControlStatus::NotSatisfied | ControlStatus::NotAssessed)
        })
        .map(|row| {
            let (priority, title) = catalog
                .requirement(&row.requirement_id)
                .map_or((Priority::Medium, "(not in catalog)"), |req| {
                    (req.priority, req.title.as_str())
                });
            (row, priority, title)
        })
        .collect();
    if gaps.is_empty() {
        return "*No remediation required.*".to_string();
    }
    gaps.sort_by(|a, b| (a.1, &a.0.requirement_id).cmp(&(b.1, &b.0.requirement_id)));
    let mut lines = vec![
        "| Requirement | Title | Priority | Target Date |".to_string(),
        "|-------------|-------|----------|-------------|".to_string(),
    ];
    for (row, priority, title) in gaps {
        let target = now.plus_days(priority.remediation_window_days()).as_utc_date();
        lines.push(format!(
            "| {} | {} | {} | {} |",
            row.requirement_id,
            truncate(title, 50),
            priority,
            target
        ));
    }
    lines.join("\n")
}

/// Builds the NIST 800-53 cross-reference table.
fn nist_crossref(rows: &[AssessmentRow], catalog: &Catalog) -> String {
    let mut lines = vec![
        "| Requirement | NIST 800-53 Controls |".to_string(),
        "|-------------|----------------------|".to_string(),
    ];
    let mut any = false;
    for row in rows {
        if let Some(requirement) = catalog.requirement(&row.requirement_id)
            && !requirement.nist_controls.is_empty()
        {
            any = true;
            lines.push(format!(
                "| {} | {} |",
                row.requirement_id,
                requirement.nist_controls.join(", ")
            ));
        }
    }
    if any {
        lines.join("\n")
    } else {
        "*No NIST 800-53 cross-references declared in this catalog.*".to_string()
    }
}

/// Builds the evidence index over rows that carry evidence.
fn evidence_index(rows: &[AssessmentRow]) -> String {
    let mut lines = vec![
        "| Requirement | Evidence | Path |".to_string(),
        "|-------------|----------|------|".to_string(),
    ];
    let mut any = false;
    for row in rows {
        if !row.evidence_description.is_empty() || !row.evidence_path.is_empty() {
            any = true;
            lines.push(format!(
                "| {} | {} | {} |",
                row.requirement_id,
                truncate(&row.evidence_description, 60),
                if row.evidence_path.is_empty() { "--" } else { row.evidence_path.as_str() }
            ));
        }
    }
    if any {
        lines.join("\n")
    } else {
        "*No evidence recorded yet.*".to_string()
    }
}

/// Builds the gate evaluation section.
fn gate_details(summary: &AssessmentSummary) -> String {
    format!(
        "**{}**\n\n**Criteria:** {}\n\n{}",
        summary.gate_result.result_label(),
        summary.gate_result.criteria,
        summary.gate_result.detail
    )
}

/// Truncates display text to a bounded number of characters.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests;
