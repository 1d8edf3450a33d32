// crates/muster-reports/src/generator/tests.rs
// ============================================================================
// Module: Report Generator Tests
// Description: Versioning, substitution, CUI marking, and section behavior.
// Purpose: Pin the strict report workflow against a real store.
// Dependencies: muster-core, muster-store-sqlite, serde_json, tempfile
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use muster_core::AssessmentRow;
use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::ControlStatus;
use muster_core::FrameworkId;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::RequirementId;
use muster_core::Timestamp;
use muster_store_sqlite::SqliteComplianceStore;
use muster_store_sqlite::SqliteStoreConfig;
use serde_json::json;

use super::ReportError;
use super::ReportOptions;
use super::generate_report;
use super::substitute;
use crate::cui::CuiConfig;

/// Fixture bundle for generator tests.
struct Fixture {
    /// Temp dir holding store, catalogs, and outputs.
    dir: tempfile::TempDir,
    /// Open store with one registered project.
    store: SqliteComplianceStore,
    /// Registered project identifier.
    project_id: ProjectId,
}

/// Builds a store, project, and CMMC catalog under one temp dir.
fn fixture(project_dir: Option<&Path>) -> Result<Fixture, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = SqliteComplianceStore::open(&SqliteStoreConfig::for_path(dir.path().join("m.db")))?;
    store.upsert_project(&Project {
        id: ProjectId::new("proj-1"),
        name: "Fixture".to_string(),
        directory_path: project_dir.map(Path::to_path_buf),
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il4,
    })?;
    let practices = json!({
        "name": "CMMC",
        "practices": [
            {"id": "AC.L2-3.1.1", "title": "Limit system access", "domain": "AC",
             "priority": "critical", "nist_controls": ["AC-2"]},
            {"id": "AC.L2-3.1.2", "title": "Limit transaction functions", "domain": "AC",
             "priority": "high"},
            {"id": "AU.L2-3.3.1", "title": "Create audit records", "domain": "AU",
             "priority": "medium"}
        ]
    });
    std::fs::write(dir.path().join("cmmc_practices.json"), practices.to_string())?;
    Ok(Fixture {
        dir,
        store,
        project_id: ProjectId::new("proj-1"),
    })
}

/// Builds report options rooted at the fixture directory.
fn options<'a>(fixture: &'a Fixture, cui: &'a CuiConfig) -> ReportOptions<'a> {
    ReportOptions {
        framework: FrameworkId::Cmmc,
        project_id: &fixture.project_id,
        catalog_dir: fixture.dir.path(),
        cui,
        template_path: None,
        output_path: None,
        fallback_dir: fixture.dir.path(),
        now: Timestamp::from_unix_millis(1_705_321_800_000),
    }
}

#[test]
fn empty_assessments_yield_run_assessor_remediation() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = fixture(None)?;
    let cui = CuiConfig::default();
    let output = generate_report(&fixture.store, &options(&fixture, &cui))?;
    assert_eq!(output.status, "success");
    assert_eq!(output.version, "1.0");
    assert!(output.markdown.contains("Run the assessor first"));
    assert!(output.markdown.contains("CUI // SP-CTI"));
    Ok(())
}

#[test]
fn versions_increment_with_each_report() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = fixture(None)?;
    let cui = CuiConfig::default();
    for expected in ["1.0", "2.0", "3.0"] {
        let output = generate_report(&fixture.store, &options(&fixture, &cui))?;
        assert_eq!(output.version, expected);
        assert!(output.output_file.exists());
    }
    Ok(())
}

#[test]
fn report_renders_rows_gaps_and_gate() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = fixture(None)?;
    let cui = CuiConfig::default();
    let row = |id: &str, status: ControlStatus| AssessmentRow {
        project_id: ProjectId::new("proj-1"),
        requirement_id: RequirementId::new(id),
        status,
        evidence_description: "config scan".to_string(),
        evidence_path: String::new(),
        notes: String::new(),
        automation_result: String::new(),
        assessor: "muster-compliance-engine".to_string(),
        updated_at: Timestamp::from_unix_millis(0),
    };
    fixture.store.upsert_assessments(
        FrameworkId::Cmmc,
        &[
            row("AC.L2-3.1.1", ControlStatus::Satisfied),
            row("AC.L2-3.1.2", ControlStatus::NotSatisfied),
            row("AU.L2-3.3.1", ControlStatus::NotApplicable),
        ],
        &AuditEvent::new(
            ProjectId::new("proj-1"),
            "cmmc_assessed",
            "seed",
            json!({}),
            Timestamp::from_unix_millis(0),
        ),
    )?;

    let output = generate_report(&fixture.store, &options(&fixture, &cui))?;
    // CMMC vocabulary in the detail table.
    assert!(output.markdown.contains("| AC.L2-3.1.1 | Limit system access | met |"));
    // Gap analysis and remediation carry the unsatisfied practice.
    assert!(output.markdown.contains("## Gap Analysis"));
    assert!(output.markdown.contains("AC.L2-3.1.2"));
    // High priority => 30-day window from 2024-01-15.
    assert!(output.markdown.contains("2024-02-14"));
    // Gate fails on the not_met practice.
    assert!(output.markdown.contains("## Security Gate Evaluation"));
    assert!(output.markdown.contains("**FAIL**"));
    // NIST cross-reference from the catalog.
    assert!(output.markdown.contains("| AC.L2-3.1.1 | AC-2 |"));
    Ok(())
}

#[test]
fn deterministic_output_for_same_rows() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = fixture(None)?;
    let cui = CuiConfig::default();
    let first = generate_report(&fixture.store, &options(&fixture, &cui))?;
    let second = generate_report(&fixture.store, &options(&fixture, &cui))?;
    // Only the version differs between consecutive runs over identical rows.
    assert_eq!(
        first.markdown.replace("1.0", "{v}"),
        second.markdown.replace("2.0", "{v}")
    );
    Ok(())
}

#[test]
fn custom_template_and_unknown_variables() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = fixture(None)?;
    let cui = CuiConfig::default();
    let template_path = fixture.dir.path().join("template.md");
    std::fs::write(&template_path, "Score: {{overall_score}} / {{unknown_thing}}\n")?;
    let mut opts = options(&fixture, &cui);
    opts.template_path = Some(&template_path);
    let output = generate_report(&fixture.store, &opts)?;
    // No assessed groupings yet, so the CMMC roll-up is zero.
    assert!(output.markdown.contains("Score: 0.0 / {{unknown_thing}}"));
    Ok(())
}

#[test]
fn missing_project_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let fixture = fixture(None)?;
    let cui = CuiConfig::default();
    let mut opts = options(&fixture, &cui);
    let absent = ProjectId::new("absent");
    opts.project_id = &absent;
    let result = generate_report(&fixture.store, &opts);
    assert!(matches!(result, Err(ReportError::NotFound(_))));
    Ok(())
}

#[test]
fn substitute_replaces_all_occurrences() {
    let mut variables = BTreeMap::new();
    variables.insert("name".to_string(), "muster".to_string());
    let rendered = substitute("{{name}} and {{name}} but not {{other}}", &variables);
    assert_eq!(rendered, "muster and muster but not {{other}}");
}
