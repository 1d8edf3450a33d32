// crates/muster-frameworks/src/assessor.rs
// ============================================================================
// Module: Assessor Base
// Description: Shared assessment workflow over the FrameworkEngine contract.
// Purpose: Load catalog, merge automated checks, upsert rows, score, gate.
// Dependencies: muster-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Every framework engine runs the same fixed workflow: load the project
//! (fatal when missing), load the catalog (fatal when missing or
//! malformed), collect deterministic automated checks, upsert one row per
//! catalog requirement with exactly one audit event, and compute a summary
//! whose score is reproducible from the stored rows alone. Engines only
//! declare their constant triple and optional checks.

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
use muster_core::FindingStatus;
use muster_core::FrameworkId;
use muster_core::GateResult;
use muster_core::Priority;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::RequirementId;
use muster_core::StigSeverity;
use muster_core::StoreError;
use muster_core::Timestamp;
use muster_core::gates;
use muster_core::scoring;
use muster_core::scoring::GroupScore;
use muster_core::scoring::StatusTally;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Assessment workflow errors.
///
/// # Invariants
/// - `NotFound` maps to an envelope error at the MCP boundary, never a
///   JSON-RPC error.
#[derive(Debug, Error)]
pub enum AssessError {
    /// Project or referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Catalog file missing or malformed (fatal to the run).
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// Storage failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AssessError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(message) => Self::NotFound(message),
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// SECTION: Engine Contract
// ============================================================================

/// Contract implemented by each framework-specific engine.
///
/// Engines declare their constant triple and may contribute deterministic
/// automated checks; everything else lives in [`run_assessment`].
pub trait FrameworkEngine: Send + Sync {
    /// Framework evaluated by this engine.
    fn framework_id(&self) -> FrameworkId;

    /// Storage table receiving the assessment rows.
    fn table_name(&self) -> &'static str;

    /// Catalog document filename under the catalog directory.
    fn catalog_filename(&self) -> &'static str;

    /// Deterministic file-scan checks keyed by requirement id.
    ///
    /// The default implementation contributes nothing; results for ids not
    /// present in the catalog are discarded by the base workflow.
    fn automated_checks(
        &self,
        project: &Project,
        project_dir: Option<&Path>,
    ) -> BTreeMap<RequirementId, ControlStatus> {
        let _ = (project, project_dir);
        BTreeMap::new()
    }
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Result of one assessment run.
///
/// # Invariants
/// - `overall_score` is reproducible from the stored rows and the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    /// Framework that was assessed.
    pub framework: FrameworkId,
    /// Assessed project.
    pub project_id: ProjectId,
    /// Per-status row counts.
    pub status_counts: StatusTally,
    /// Per-grouping score roll-up.
    pub group_scores: BTreeMap<String, GroupScore>,
    /// Overall composite score (one decimal place).
    pub overall_score: f64,
    /// Gate evaluation result.
    pub gate_result: GateResult,
    /// Number of rows assigned by automated checks.
    pub auto_assessed: u64,
    /// Total catalog requirements evaluated.
    pub total_requirements: u64,
    /// Non-fatal warnings surfaced to the caller's diagnostics stream.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Workflow
// ============================================================================

/// Runs the fixed assessment workflow for one `(project, framework)` pair.
///
/// # Errors
///
/// Returns [`AssessError::NotFound`] when the project does not exist,
/// [`AssessError::Catalog`] when the catalog is missing or malformed, and
/// [`AssessError::Store`] when persistence fails.
pub fn run_assessment<S: ComplianceStore>(
    store: &S,
    engine: &dyn FrameworkEngine,
    catalog_dir: &Path,
    project_id: &ProjectId,
    now: Timestamp,
) -> Result<AssessmentSummary, AssessError> {
    let framework = engine.framework_id();
    let project = store.load_project(project_id)?;
    let catalog = load_catalog(catalog_dir, engine.catalog_filename())?;

    let mut warnings = Vec::new();
    let project_dir = resolve_project_dir(&project, &mut warnings);
    let auto = engine.automated_checks(&project, project_dir.as_deref());

    let prior: BTreeMap<RequirementId, AssessmentRow> = store
        .load_assessments(framework, project_id)?
        .into_iter()
        .map(|row| (row.requirement_id.clone(), row))
        .collect();

    let mut rows = Vec::with_capacity(catalog.requirements.len());
    for requirement in &catalog.requirements {
        let prior_row = prior.get(&requirement.id);
        let row = match auto.get(&requirement.id) {
            Some(status) => {
                AssessmentRow {
                    project_id: project_id.clone(),
                    requirement_id: requirement.id.clone(),
                    status: *status,
                    evidence_description: "automated file scan".to_string(),
                    evidence_path: prior_row.map(|p| p.evidence_path.clone()).unwrap_or_default(),
                    notes: prior_row.map(|p| p.notes.clone()).unwrap_or_default(),
                    automation_result: status.as_str().to_string(),
                    assessor: "muster-compliance-engine".to_string(),
                    updated_at: now,
                }
            }
            None => {
                let status = match prior_row.map(|p| p.status) {
                    Some(ControlStatus::NotApplicable) => ControlStatus::NotApplicable,
                    Some(ControlStatus::RiskAccepted) => ControlStatus::RiskAccepted,
                    _ => ControlStatus::NotAssessed,
                };
                AssessmentRow {
                    project_id: project_id.clone(),
                    requirement_id: requirement.id.clone(),
                    status,
                    evidence_description: prior_row
                        .map(|p| p.evidence_description.clone())
                        .unwrap_or_default(),
                    evidence_path: prior_row.map(|p| p.evidence_path.clone()).unwrap_or_default(),
                    notes: prior_row.map(|p| p.notes.clone()).unwrap_or_default(),
                    automation_result: String::new(),
                    assessor: "muster-compliance-engine".to_string(),
                    updated_at: now,
                }
            }
        };
        rows.push(row);
    }

    let summary = summarize_rows(store, framework, project_id, &catalog, &rows, warnings)?;

    let event = AuditEvent::new(
        project_id.clone(),
        format!("{}_assessed", framework.as_str()),
        format!(
            "{} assessment: {} requirements, score {:.1}, gate {}",
            framework.display_name(),
            summary.total_requirements,
            summary.overall_score,
            summary.gate_result.result_label()
        ),
        json!({
            "total_requirements": summary.total_requirements,
            "auto_assessed": summary.auto_assessed,
            "overall_score": summary.overall_score,
            "gate_result": summary.gate_result.result_label(),
            "status_counts": summary.status_counts,
        }),
        now,
    );
    store.upsert_assessments(framework, &rows, &event)?;
    Ok(summary)
}

/// Loads and parses the catalog document for an engine.
fn load_catalog(catalog_dir: &Path, filename: &str) -> Result<Catalog, AssessError> {
    let path = catalog_dir.join(filename);
    let text = std::fs::read_to_string(&path).map_err(|err| {
        AssessError::Catalog(CatalogError::Io(format!("{}: {err}", path.display())))
    })?;
    Ok(Catalog::from_text(&text)?)
}

/// Resolves the project directory, warning when it is configured but absent.
fn resolve_project_dir(project: &Project, warnings: &mut Vec<String>) -> Option<PathBuf> {
    match &project.directory_path {
        Some(path) if path.is_dir() => Some(path.clone()),
        Some(path) => {
            warnings.push(format!(
                "project directory not found: {}; running catalog-only assessment",
                path.display()
            ));
            None
        }
        None => None,
    }
}

/// Computes the summary for a prepared row set.
///
/// Also used by the report generators to recompute scores and gates from
/// the persisted rows, keeping reports reproducible from storage alone.
///
/// # Errors
///
/// Returns [`AssessError::Store`] when the IV&V gate cannot load findings.
pub fn summarize_rows<S: ComplianceStore>(
    store: &S,
    framework: FrameworkId,
    project_id: &ProjectId,
    catalog: &Catalog,
    rows: &[AssessmentRow],
    warnings: Vec<String>,
) -> Result<AssessmentSummary, AssessError> {
    let status_counts = StatusTally::from_statuses(rows.iter().map(|row| row.status));
    let grouped = rows.iter().map(|row| {
        let grouping = catalog
            .requirement(&row.requirement_id)
            .map_or_else(|| "general".to_string(), |req| req.grouping.clone());
        (grouping, row.status)
    });
    let score_fn = match framework {
        FrameworkId::Cmmc | FrameworkId::Ivv => scoring::cmmc_score,
        _ => scoring::weighted_score,
    };
    let group_scores = scoring::grouping_scores(grouped, score_fn);

    let overall_score = match framework {
        FrameworkId::Cmmc => scoring::overall_from_groups(&group_scores),
        FrameworkId::Ivv => ivv_overall_score(&group_scores),
        _ => scoring::round1(scoring::weighted_score(&status_counts)),
    };

    let critical_not_satisfied = rows
        .iter()
        .filter(|row| {
            row.status == ControlStatus::NotSatisfied
                && catalog
                    .requirement(&row.requirement_id)
                    .is_some_and(|req| req.priority == Priority::Critical)
        })
        .count() as u64;

    let gate_result = match framework {
        FrameworkId::Cmmc => gates::cmmc_gate(&status_counts),
        FrameworkId::Atlas => gates::atlas_gate(&status_counts),
        FrameworkId::Sbd => gates::sbd_gate(critical_not_satisfied),
        FrameworkId::Fedramp => {
            let statuses_by_id: BTreeMap<String, ControlStatus> = rows
                .iter()
                .map(|row| (row.requirement_id.as_str().to_string(), row.status))
                .collect();
            gates::fedramp_gate(&statuses_by_id, &group_scores, overall_score)
        }
        FrameworkId::Ivv => {
            let critical_open = store
                .load_findings(project_id)?
                .iter()
                .filter(|finding| {
                    finding.severity == StigSeverity::Cat1
                        && finding.status == FindingStatus::Open
                })
                .count() as u64;
            gates::ivv_gate(critical_open)
        }
        FrameworkId::Nist80053 => {
            gates::critical_priority_gate("nist_800_53_baseline", critical_not_satisfied)
        }
        FrameworkId::Fips => {
            gates::critical_priority_gate("fips_minimum_security", critical_not_satisfied)
        }
        FrameworkId::Cssp => {
            gates::critical_priority_gate("cssp_requirements", critical_not_satisfied)
        }
        FrameworkId::Zta => gates::critical_priority_gate("zta_posture", critical_not_satisfied),
    };

    Ok(AssessmentSummary {
        framework,
        project_id: project_id.clone(),
        status_counts,
        group_scores,
        overall_score,
        gate_result,
        auto_assessed: rows.iter().filter(|row| !row.automation_result.is_empty()).count() as u64,
        total_requirements: rows.len() as u64,
        warnings,
    })
}

/// IV&V overall: 0.6 x verification mean + 0.4 x validation mean.
///
/// Validation areas are the groupings whose label starts with `validation`;
/// every other grouping counts toward verification.
fn ivv_overall_score(groups: &BTreeMap<String, GroupScore>) -> f64 {
    let (validation, verification): (Vec<_>, Vec<_>) = groups
        .iter()
        .filter(|(_, group)| group.tally.total() > 0)
        .partition(|(name, _)| name.to_lowercase().starts_with("validation"));
    let mean = |areas: &[(&String, &GroupScore)]| -> f64 {
        if areas.is_empty() {
            100.0
        } else {
            areas.iter().map(|(_, group)| group.score).sum::<f64>() / areas.len() as f64
        }
    };
    scoring::round1(scoring::ivv_overall(mean(&verification), mean(&validation)))
}

#[cfg(test)]
mod tests;
