// crates/muster-reports/src/stig_report/tests.rs
// ============================================================================
// Module: STIG Checklist Tests
// Description: Gate rendering and summary table behavior.
// Purpose: Pin the checklist document against a stored finding set.
// Dependencies: muster-core, muster-store-sqlite, serde_json, tempfile
// ============================================================================

use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::Finding;
use muster_core::FindingId;
use muster_core::FindingStatus;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::StigSeverity;
use muster_core::Timestamp;
use muster_store_sqlite::SqliteComplianceStore;
use muster_store_sqlite::SqliteStoreConfig;
use serde_json::json;

use super::generate_stig_checklist;
use crate::cui::CuiConfig;

#[test]
fn open_cat1_finding_renders_gate_fail() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = SqliteComplianceStore::open(&SqliteStoreConfig::for_path(dir.path().join("m.db")))?;
    store.upsert_project(&Project {
        id: ProjectId::new("proj-1"),
        name: "Fixture".to_string(),
        directory_path: None,
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il4,
    })?;
    store.replace_findings(
        &ProjectId::new("proj-1"),
        &[Finding {
            project_id: ProjectId::new("proj-1"),
            finding_id: FindingId::new("V-222635"),
            rule_id: "SV-222635r879887".to_string(),
            severity: StigSeverity::Cat1,
            title: "Detailed error messages must not be exposed to users".to_string(),
            status: FindingStatus::Open,
            evidence: "Debug mode or detailed error exposure detected.".to_string(),
            fix_text: "Disable debug mode in production.".to_string(),
            updated_at: Timestamp::from_unix_millis(0),
        }],
        &AuditEvent::new(
            ProjectId::new("proj-1"),
            "stig_checked",
            "seed",
            json!({}),
            Timestamp::from_unix_millis(0),
        ),
    )?;

    let cui = CuiConfig::default();
    let output = generate_stig_checklist(
        &store,
        &ProjectId::new("proj-1"),
        &cui,
        None,
        dir.path(),
        Timestamp::from_unix_millis(0),
    )?;

    assert_eq!(output.cat1_open, 1);
    assert!(!output.gate_result.passed);
    assert!(output.markdown.contains("## Security Gate Evaluation"));
    assert!(output.markdown.contains("**FAIL**"));
    assert!(output.markdown.contains("| CAT1 | 1 | 0 | 0 | 0 | 1 |"));
    assert!(output.markdown.contains("V-222635"));
    assert!(output.markdown.contains("CUI // SP-CTI"));
    assert_eq!(output.version, "1.0");
    assert!(output.output_file.exists());

    // Second checklist increments the version.
    let second = generate_stig_checklist(
        &store,
        &ProjectId::new("proj-1"),
        &cui,
        None,
        dir.path(),
        Timestamp::from_unix_millis(0),
    )?;
    assert_eq!(second.version, "2.0");
    Ok(())
}

#[test]
fn empty_finding_set_renders_placeholder_and_passes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = SqliteComplianceStore::open(&SqliteStoreConfig::for_path(dir.path().join("m.db")))?;
    store.upsert_project(&Project {
        id: ProjectId::new("proj-1"),
        name: "Fixture".to_string(),
        directory_path: None,
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il2,
    })?;

    let cui = CuiConfig::default();
    let output = generate_stig_checklist(
        &store,
        &ProjectId::new("proj-1"),
        &cui,
        None,
        dir.path(),
        Timestamp::from_unix_millis(0),
    )?;
    assert!(output.gate_result.passed);
    assert!(output.markdown.contains("Run the STIG checker first"));
    Ok(())
}
