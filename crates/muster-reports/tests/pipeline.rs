// crates/muster-reports/tests/pipeline.rs
// ============================================================================
// Module: Reporting Pipeline Tests
// Description: Assess, report, checklist, RTM, and SBOM over one project.
// Purpose: Exercise the full persisted-state pipeline end to end.
// Dependencies: muster-core, muster-frameworks, muster-reports,
//               muster-store-sqlite, serde_json, tempfile
// ============================================================================

//! Full pipeline: run an assessment and the STIG checker, then generate
//! every artifact family from the persisted state and check the audit
//! trail versioning holds across them.

use muster_core::ComplianceStore;
use muster_core::FrameworkId;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::Timestamp;
use muster_frameworks::engine_for;
use muster_frameworks::run_assessment;
use muster_frameworks::run_stig_check;
use muster_reports::CuiConfig;
use muster_reports::generate_report;
use muster_reports::generate_rtm;
use muster_reports::generate_sbom;
use muster_reports::generate_stig_checklist;
use muster_reports::generator::ReportOptions;
use muster_store_sqlite::SqliteComplianceStore;
use muster_store_sqlite::SqliteStoreConfig;
use serde_json::json;

/// Fixed timestamp used across the pipeline (2024-01-15T12:30:00Z).
const NOW: i64 = 1_705_321_800_000;

#[test]
fn full_pipeline_over_one_project() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let project_dir = dir.path().join("app");
    std::fs::create_dir_all(project_dir.join("src"))?;
    std::fs::create_dir_all(project_dir.join("tests"))?;

    // Project artifacts: a ZTA-relevant manifest, a feature, a matching
    // test, and dependency files for the SBOM.
    std::fs::write(
        project_dir.join("policy.yaml"),
        "kind: NetworkPolicy\nmetadata:\n  name: default-deny\n",
    )?;
    std::fs::write(project_dir.join("ledger.feature"), "Feature: Ledger Transfer\n")?;
    std::fs::write(project_dir.join("src/ledger.py"), "def transfer():\n    pass\n")?;
    std::fs::write(project_dir.join("tests/test_ledger.py"), "def test_transfer():\n    pass\n")?;
    std::fs::write(project_dir.join("requirements.txt"), "requests==2.31.0\n")?;
    std::fs::write(
        project_dir.join("package.json"),
        r#"{"dependencies": {"lodash": "^4.17.21"}}"#,
    )?;

    // Catalog for the ZTA engine.
    let catalog = json!({
        "name": "Zero Trust Architecture",
        "requirements": [
            {"id": "ZTA-NET-1", "title": "Micro-segmentation", "pillar": "network",
             "priority": "critical"},
            {"id": "ZTA-NET-3", "title": "Default deny posture", "pillar": "network",
             "priority": "high"}
        ]
    });
    std::fs::write(dir.path().join("nist_800_207_zta.json"), catalog.to_string())?;

    let store = SqliteComplianceStore::open(&SqliteStoreConfig::for_path(dir.path().join("m.db")))?;
    let project_id = ProjectId::new("proj-pipe");
    store.upsert_project(&Project {
        id: project_id.clone(),
        name: "Pipeline Fixture".to_string(),
        directory_path: Some(project_dir.clone()),
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il4,
    })?;
    let now = Timestamp::from_unix_millis(NOW);

    // 1. Assessment: the NetworkPolicy/default-deny scans satisfy both rows.
    let engine = engine_for(FrameworkId::Zta);
    let summary = run_assessment(&store, engine.as_ref(), dir.path(), &project_id, now)?;
    assert_eq!(summary.status_counts.satisfied, 2);
    assert!(summary.gate_result.passed);
    assert_eq!(store.count_audit_events(&project_id, "zta_assessed")?, 1);

    // 2. STIG checker over the same tree.
    let stig = run_stig_check(&store, &project_id, now)?;
    assert_eq!(stig.findings.len(), 9);
    assert!(stig.gate_result.passed);

    // 3. Framework report from the persisted rows.
    let cui = CuiConfig::default();
    let options = ReportOptions {
        framework: FrameworkId::Zta,
        project_id: &project_id,
        catalog_dir: dir.path(),
        cui: &cui,
        template_path: None,
        output_path: None,
        fallback_dir: dir.path(),
        now,
    };
    let report = generate_report(&store, &options)?;
    assert_eq!(report.version, "1.0");
    assert!(report.output_file.starts_with(project_dir.join("compliance")));
    assert!(report.markdown.contains("CUI // SP-CTI"));
    assert!(report.markdown.contains("**PASS**"));

    // 4. STIG checklist document.
    let checklist = generate_stig_checklist(&store, &project_id, &cui, None, dir.path(), now)?;
    assert_eq!(checklist.version, "1.0");
    assert!(checklist.markdown.contains("## Security Gate Evaluation"));

    // 5. RTM over the feature/test pair.
    let rtm = generate_rtm(&store, &project_id, &cui, now)?;
    assert_eq!(rtm.total_requirements, 1);
    assert!((rtm.coverage - 100.0).abs() < f64::EPSILON);

    // 6. SBOM across both ecosystems.
    let sbom = generate_sbom(&store, &project_id, None, dir.path(), now)?;
    assert_eq!(sbom.component_count, 2);
    assert_eq!(sbom.version, "1.0");

    // Audit trail carries one event per artifact family.
    for event_type in
        ["zta_assessed", "stig_checked", "zta_report_generated", "stig_report_generated",
         "compliance_check", "sbom_generated"]
    {
        assert_eq!(
            store.count_audit_events(&project_id, event_type)?,
            1,
            "expected one {event_type} event"
        );
    }
    Ok(())
}
