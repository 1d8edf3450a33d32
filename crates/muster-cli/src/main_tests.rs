// crates/muster-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Unit Tests
// Description: Argument mapping, gate exit codes, and config resolution.
// Purpose: Pin the CLI surface without spawning processes.
// Dependencies: clap, tempfile
// ============================================================================

use std::process::ExitCode;

use clap::CommandFactory;
use muster_core::FrameworkId;
use muster_core::GateResult;

use super::Cli;
use super::FrameworkArg;
use super::gate_exit_code;
use super::load_config;

#[test]
fn cli_definition_is_well_formed() {
    Cli::command().debug_assert();
}

#[test]
fn framework_args_map_onto_framework_ids() {
    assert_eq!(FrameworkId::from(FrameworkArg::Cmmc), FrameworkId::Cmmc);
    assert_eq!(FrameworkId::from(FrameworkArg::Zta), FrameworkId::Zta);
    assert_eq!(FrameworkId::from(FrameworkArg::Nist80053), FrameworkId::Nist80053);
}

#[test]
fn gate_flag_maps_failures_to_exit_one() {
    let failed = GateResult {
        gate: "stig_security".to_string(),
        criteria: "0 CAT1 findings Open".to_string(),
        passed: false,
        detail: "FAIL: 1 CAT1 finding(s) Open".to_string(),
    };
    let passed = GateResult {
        passed: true,
        ..failed.clone()
    };
    // Gate failures are results; without --gate they exit 0.
    assert_eq!(format!("{:?}", gate_exit_code(false, &failed)), format!("{:?}", ExitCode::SUCCESS));
    assert_eq!(format!("{:?}", gate_exit_code(true, &failed)), format!("{:?}", ExitCode::FAILURE));
    assert_eq!(format!("{:?}", gate_exit_code(true, &passed)), format!("{:?}", ExitCode::SUCCESS));
}

#[test]
fn explicit_config_flag_loads_the_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("muster.toml");
    std::fs::write(&path, "data_dir = \"/srv/muster\"\n")?;
    let config = load_config(Some(&path))?;
    assert_eq!(config.data_dir, std::path::PathBuf::from("/srv/muster"));

    // No flag and no environment variable: defaults apply.
    let default = load_config(None)?;
    assert!(default.catalog_dir.ends_with("catalogs"));
    Ok(())
}
