// crates/muster-frameworks/src/assessor/tests.rs
// ============================================================================
// Module: Assessor Base Tests
// Description: Fixed-workflow behavior over a real store and catalog files.
// Purpose: Pin catalog loading, status preservation, scoring, and audit.
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

use super::AssessError;
use super::FrameworkEngine;
use super::run_assessment;
use crate::engines::CmmcEngine;

/// Test engine with a fixed set of automated results.
struct FixedEngine {
    /// Automated results returned for every run.
    results: BTreeMap<RequirementId, ControlStatus>,
}

impl FrameworkEngine for FixedEngine {
    fn framework_id(&self) -> FrameworkId {
        FrameworkId::Zta
    }

    fn table_name(&self) -> &'static str {
        "zta_assessments"
    }

    fn catalog_filename(&self) -> &'static str {
        "nist_800_207_zta.json"
    }

    fn automated_checks(
        &self,
        _project: &Project,
        _project_dir: Option<&Path>,
    ) -> BTreeMap<RequirementId, ControlStatus> {
        self.results.clone()
    }
}

/// Opens a store with one registered project.
fn open_store(dir: &Path) -> Result<SqliteComplianceStore, Box<dyn std::error::Error>> {
    let store = SqliteComplianceStore::open(&SqliteStoreConfig::for_path(dir.join("muster.db")))?;
    store.upsert_project(&Project {
        id: ProjectId::new("proj-1"),
        name: "Fixture".to_string(),
        directory_path: None,
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il4,
    })?;
    Ok(store)
}

/// Writes a minimal ZTA catalog into the catalog directory.
fn write_zta_catalog(catalog_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = json!({
        "name": "Zero Trust Architecture",
        "version": "1.0",
        "requirements": [
            {"id": "ZTA-NET-1", "title": "Micro-segmentation", "pillar": "network",
             "priority": "critical"},
            {"id": "ZTA-NET-2", "title": "Mutual TLS", "pillar": "network",
             "priority": "high"},
            {"id": "ZTA-ID-1", "title": "Central identity provider", "pillar": "identity",
             "priority": "critical"}
        ]
    });
    std::fs::write(catalog_dir.join("nist_800_207_zta.json"), catalog.to_string())?;
    Ok(())
}

#[test]
fn missing_project_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = open_store(dir.path())?;
    write_zta_catalog(dir.path())?;
    let engine = FixedEngine {
        results: BTreeMap::new(),
    };
    let result = run_assessment(
        &store,
        &engine,
        dir.path(),
        &ProjectId::new("absent"),
        Timestamp::from_unix_millis(0),
    );
    assert!(matches!(result, Err(AssessError::NotFound(_))));
    Ok(())
}

#[test]
fn missing_catalog_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = open_store(dir.path())?;
    let engine = FixedEngine {
        results: BTreeMap::new(),
    };
    let result = run_assessment(
        &store,
        &engine,
        dir.path(),
        &ProjectId::new("proj-1"),
        Timestamp::from_unix_millis(0),
    );
    assert!(matches!(result, Err(AssessError::Catalog(_))));
    Ok(())
}

#[test]
fn auto_statuses_apply_and_unknown_ids_are_dropped() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = open_store(dir.path())?;
    write_zta_catalog(dir.path())?;
    let mut results = BTreeMap::new();
    results.insert(RequirementId::new("ZTA-NET-1"), ControlStatus::Satisfied);
    results.insert(RequirementId::new("ZTA-UNKNOWN"), ControlStatus::Satisfied);
    let engine = FixedEngine {
        results,
    };

    let summary = run_assessment(
        &store,
        &engine,
        dir.path(),
        &ProjectId::new("proj-1"),
        Timestamp::from_unix_millis(0),
    )?;
    assert_eq!(summary.total_requirements, 3);
    assert_eq!(summary.auto_assessed, 1);
    assert_eq!(summary.status_counts.satisfied, 1);
    assert_eq!(summary.status_counts.not_assessed, 2);

    let rows = store.load_assessments(FrameworkId::Zta, &ProjectId::new("proj-1"))?;
    assert_eq!(rows.len(), 3);
    assert!(
        rows.iter()
            .all(|row| !row.requirement_id.as_str().contains("UNKNOWN"))
    );
    assert_eq!(store.count_audit_events(&ProjectId::new("proj-1"), "zta_assessed")?, 1);
    Ok(())
}

#[test]
fn not_applicable_and_risk_accepted_are_preserved() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = open_store(dir.path())?;
    write_zta_catalog(dir.path())?;

    // Seed a prior assessment with one N/A and one risk-accepted row.
    let seed = |requirement: &str, status: ControlStatus| AssessmentRow {
        project_id: ProjectId::new("proj-1"),
        requirement_id: RequirementId::new(requirement),
        status,
        evidence_description: "waiver".to_string(),
        evidence_path: String::new(),
        notes: "approved waiver".to_string(),
        automation_result: String::new(),
        assessor: "assessor-a".to_string(),
        updated_at: Timestamp::from_unix_millis(0),
    };
    store.upsert_assessments(
        FrameworkId::Zta,
        &[
            seed("ZTA-NET-1", ControlStatus::NotApplicable),
            seed("ZTA-ID-1", ControlStatus::RiskAccepted),
        ],
        &AuditEvent::new(
            ProjectId::new("proj-1"),
            "zta_assessed",
            "seed",
            json!({}),
            Timestamp::from_unix_millis(0),
        ),
    )?;

    // Re-run with an auto override for ZTA-ID-1 only.
    let mut results = BTreeMap::new();
    results.insert(RequirementId::new("ZTA-ID-1"), ControlStatus::Satisfied);
    let engine = FixedEngine {
        results,
    };
    let summary = run_assessment(
        &store,
        &engine,
        dir.path(),
        &ProjectId::new("proj-1"),
        Timestamp::from_unix_millis(1_000),
    )?;

    // N/A preserved without an override; risk_accepted overridden by auto.
    assert_eq!(summary.status_counts.not_applicable, 1);
    assert_eq!(summary.status_counts.risk_accepted, 0);
    assert_eq!(summary.status_counts.satisfied, 1);

    let rows = store.load_assessments(FrameworkId::Zta, &ProjectId::new("proj-1"))?;
    let na_row = rows
        .iter()
        .find(|row| row.requirement_id.as_str() == "ZTA-NET-1")
        .ok_or("missing ZTA-NET-1")?;
    assert_eq!(na_row.status, ControlStatus::NotApplicable);
    assert_eq!(na_row.notes, "approved waiver");
    Ok(())
}

#[test]
fn cmmc_summary_matches_documented_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = open_store(dir.path())?;

    // Ten practices in one domain: 8 met, 1 partially met, 1 N/A.
    let mut practices = Vec::new();
    for index in 1..=10 {
        practices.push(json!({
            "id": format!("AC.L2-3.1.{index}"),
            "title": format!("Practice {index}"),
            "domain": "AC"
        }));
    }
    std::fs::write(
        dir.path().join("cmmc_practices.json"),
        json!({"name": "CMMC", "practices": practices}).to_string(),
    )?;

    let mut results = BTreeMap::new();
    for index in 1..=8 {
        results.insert(
            RequirementId::new(format!("AC.L2-3.1.{index}")),
            ControlStatus::Satisfied,
        );
    }
    results.insert(RequirementId::new("AC.L2-3.1.9"), ControlStatus::PartiallySatisfied);
    results.insert(RequirementId::new("AC.L2-3.1.10"), ControlStatus::NotApplicable);

    /// CMMC engine variant whose checks come from the fixture map.
    struct FixedCmmc(BTreeMap<RequirementId, ControlStatus>);
    impl FrameworkEngine for FixedCmmc {
        fn framework_id(&self) -> FrameworkId {
            CmmcEngine.framework_id()
        }
        fn table_name(&self) -> &'static str {
            CmmcEngine.table_name()
        }
        fn catalog_filename(&self) -> &'static str {
            CmmcEngine.catalog_filename()
        }
        fn automated_checks(
            &self,
            _project: &Project,
            _project_dir: Option<&Path>,
        ) -> BTreeMap<RequirementId, ControlStatus> {
            self.0.clone()
        }
    }

    let summary = run_assessment(
        &store,
        &FixedCmmc(results),
        dir.path(),
        &ProjectId::new("proj-1"),
        Timestamp::from_unix_millis(0),
    )?;

    // 100 * (8 + 0.5) / 9 = 94.4 after rounding.
    assert!((summary.overall_score - 94.4).abs() < f64::EPSILON);
    assert!(summary.gate_result.passed);
    Ok(())
}
