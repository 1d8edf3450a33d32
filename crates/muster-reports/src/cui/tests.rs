// crates/muster-reports/src/cui/tests.rs
// ============================================================================
// Module: CUI Marker Tests
// Description: Banner idempotence, config fallback, and directory marking.
// Purpose: Pin the marking semantics the report generators depend on.
// Dependencies: tempfile
// ============================================================================

use super::CuiConfig;
use super::MarkOutcome;
use super::mark_directory;
use super::mark_document;

#[test]
fn defaults_match_dod_boilerplate() {
    let config = CuiConfig::default();
    assert_eq!(config.banner_top, "CUI // SP-CTI");
    assert!(config.document_header.contains("CONTROLLED UNCLASSIFIED INFORMATION"));
    assert!(config.document_footer.contains("Department of Defense"));
}

#[test]
fn apply_is_idempotent() {
    let config = CuiConfig::default();
    let marked = config.apply("# Report\n\nbody text");
    assert!(marked.contains("CUI // SP-CTI"));
    assert!(marked.starts_with(config.document_header.trim()));
    assert!(marked.trim_end().ends_with(config.document_footer.trim()));

    let twice = config.apply(&marked);
    assert_eq!(marked, twice);
}

#[test]
fn loaded_keys_override_defaults_individually() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cui_markings.yaml");
    std::fs::write(&path, "banner_top: \"CUI // CUSTOM\"\n")?;
    let config = CuiConfig::load(Some(&path));
    assert_eq!(config.banner_top, "CUI // CUSTOM");
    // Unspecified keys keep their defaults.
    assert!(config.document_footer.contains("Department of Defense"));

    // Missing file falls back to defaults entirely.
    let fallback = CuiConfig::load(Some(&dir.path().join("absent.yaml")));
    assert_eq!(fallback, CuiConfig::default());
    Ok(())
}

#[test]
fn document_marking_detects_existing_banner() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = CuiConfig::default();
    let path = dir.path().join("report.md");
    std::fs::write(&path, "# Title\n\ncontent\n")?;

    assert_eq!(mark_document(&path, &config, false)?, MarkOutcome::Marked);
    assert_eq!(mark_document(&path, &config, false)?, MarkOutcome::AlreadyMarked);

    let code = dir.path().join("main.rs");
    std::fs::write(&code, "fn main() {}\n")?;
    assert_eq!(mark_document(&code, &config, false)?, MarkOutcome::Skipped);
    Ok(())
}

#[test]
fn directory_marking_walks_documents_only() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("docs"))?;
    std::fs::create_dir_all(dir.path().join("node_modules"))?;
    std::fs::write(dir.path().join("docs/a.md"), "alpha\n")?;
    std::fs::write(dir.path().join("docs/b.txt"), "bravo\n")?;
    std::fs::write(dir.path().join("docs/c.rs"), "fn c() {}\n")?;
    std::fs::write(dir.path().join("node_modules/skip.md"), "vendored\n")?;

    let config = CuiConfig::default();
    let summary = mark_directory(dir.path(), &config, false)?;
    assert_eq!(summary.marked.len(), 2);
    assert_eq!(summary.already_marked, 0);

    // Second pass marks nothing new.
    let summary = mark_directory(dir.path(), &config, false)?;
    assert!(summary.marked.is_empty());
    assert_eq!(summary.already_marked, 2);
    Ok(())
}
