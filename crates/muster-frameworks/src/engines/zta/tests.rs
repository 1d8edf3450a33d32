// crates/muster-frameworks/src/engines/zta/tests.rs
// ============================================================================
// Module: ZTA Engine Tests
// Description: Indicator detection and requirement mapping checks.
// Purpose: Pin the YAML/Terraform scan rules to their ZTA requirement ids.
// Dependencies: muster-core, tempfile
// ============================================================================

use std::path::Path;

use muster_core::ControlStatus;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::RequirementId;

use super::ZtaEngine;
use crate::assessor::FrameworkEngine;

/// Builds a project record pointing at a scan fixture.
fn project(dir: &Path) -> Project {
    Project {
        id: ProjectId::new("proj-zta"),
        name: "ZTA Fixture".to_string(),
        directory_path: Some(dir.to_path_buf()),
        classification: "CUI".to_string(),
        impact_level: ImpactLevel::Il4,
    }
}

#[test]
fn yaml_indicators_map_to_requirements() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("mesh.yaml"),
        "apiVersion: security.istio.io/v1beta1\nkind: PeerAuthentication\nspec:\n  mtls:\n    mode: STRICT\n",
    )?;
    std::fs::write(
        dir.path().join("netpol.yaml"),
        "kind: NetworkPolicy\nmetadata:\n  name: default-deny\n",
    )?;

    let engine = ZtaEngine;
    let checks = engine.automated_checks(&project(dir.path()), Some(dir.path()));

    assert_eq!(checks.get(&RequirementId::new("ZTA-NET-2")), Some(&ControlStatus::Satisfied));
    assert_eq!(checks.get(&RequirementId::new("ZTA-NET-1")), Some(&ControlStatus::Satisfied));
    assert_eq!(checks.get(&RequirementId::new("ZTA-NET-3")), Some(&ControlStatus::Satisfied));
    // Istio implies a service mesh architecture.
    assert_eq!(checks.get(&RequirementId::new("ZTA-ARCH-1")), Some(&ControlStatus::Satisfied));
    // No identity provider indicators in this fixture.
    assert!(!checks.contains_key(&RequirementId::new("ZTA-ID-1")));
    Ok(())
}

#[test]
fn source_and_terraform_indicators_detected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("audit.py"), "logger = audit_log_writer()\n")?;
    std::fs::write(dir.path().join("main.tf"), "resource \"aws_guardduty_detector\" \"d\" {}\n")?;
    std::fs::write(dir.path().join("sbom.py"), "emit_cyclonedx_document()\n")?;

    let engine = ZtaEngine;
    let checks = engine.automated_checks(&project(dir.path()), Some(dir.path()));

    assert_eq!(checks.get(&RequirementId::new("ZTA-VIS-1")), Some(&ControlStatus::Satisfied));
    assert_eq!(
        checks.get(&RequirementId::new("ZTA-VIS-2")),
        Some(&ControlStatus::PartiallySatisfied)
    );
    assert_eq!(
        checks.get(&RequirementId::new("ZTA-APP-4")),
        Some(&ControlStatus::PartiallySatisfied)
    );
    Ok(())
}

#[test]
fn missing_directory_yields_no_checks() {
    let engine = ZtaEngine;
    let fixture = Project {
        directory_path: None,
        ..project(Path::new("/nonexistent"))
    };
    assert!(engine.automated_checks(&fixture, None).is_empty());
}
