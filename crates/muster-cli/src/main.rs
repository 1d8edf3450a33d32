// crates/muster-cli/src/main.rs
// ============================================================================
// Module: Muster CLI Entry Point
// Description: Command dispatcher for Muster servers and compliance tasks.
// Purpose: Serve MCP over stdio and drive assessments, reports, and builders.
// Dependencies: clap, muster-config, muster-core, muster-frameworks,
//               muster-mcp, muster-reports, muster-store-sqlite, serde_json
// ============================================================================

//! ## Overview
//! The `muster` binary serves the MCP servers over stdio and runs the
//! compliance workflows directly. Exit codes: 0 on success (including EOF
//! shutdown of a server), 1 on not-found or invalid arguments, fatal I/O
//! loop errors, and gate failures when `--gate` is set. Gate failures are
//! ordinary results; only the explicit flag maps them to the exit code.
//! stdout carries command output only; diagnostics go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use muster_config::CONFIG_ENV;
use muster_config::MusterConfig;
use muster_core::FrameworkId;
use muster_core::GateResult;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::SessionId;
use muster_core::clarify;
use muster_core::interfaces::ComplianceStore;
use muster_core::interfaces::IntakeStore;
use muster_frameworks::engine_for;
use muster_frameworks::run_assessment;
use muster_frameworks::run_stig_check;
use muster_mcp::build_compliance_server;
use muster_mcp::build_requirements_server;
use muster_mcp::servers::current_timestamp;
use muster_reports::CuiConfig;
use muster_reports::cui;
use muster_reports::generate_report;
use muster_reports::generate_rtm;
use muster_reports::generate_sbom;
use muster_reports::generate_stig_checklist;
use muster_reports::generator::ReportOptions;
use muster_store_sqlite::SqliteComplianceStore;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "muster", version, about = "Muster compliance platform CLI")]
struct Cli {
    /// Configuration file path (falls back to `MUSTER_CONFIG`, then defaults).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a Muster MCP server over stdio.
    Serve {
        /// Server to start.
        #[arg(long, value_enum, default_value = "compliance")]
        server: ServerKind,
    },
    /// Create or update a project record.
    ProjectCreate {
        /// Project identifier.
        #[arg(long)]
        project_id: String,
        /// Project name.
        #[arg(long)]
        name: String,
        /// On-disk project directory.
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Classification label.
        #[arg(long, default_value = "CUI")]
        classification: String,
        /// Impact level (IL2, IL4, IL5, IL6).
        #[arg(long, default_value = "IL4")]
        impact_level: String,
    },
    /// Run a framework assessment.
    Assess {
        /// Project identifier.
        #[arg(long)]
        project_id: String,
        /// Framework identifier.
        #[arg(long, value_enum)]
        framework: FrameworkArg,
        /// Exit 1 when the gate fails.
        #[arg(long)]
        gate: bool,
    },
    /// Generate a framework assessment report.
    Report {
        /// Project identifier.
        #[arg(long)]
        project_id: String,
        /// Framework identifier.
        #[arg(long, value_enum)]
        framework: FrameworkArg,
        /// Template file overriding the built-in template.
        #[arg(long)]
        template: Option<PathBuf>,
        /// Explicit output path.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Exit 1 when the gate fails.
        #[arg(long)]
        gate: bool,
    },
    /// Run the web-application STIG checklist.
    Stig {
        /// Project identifier.
        #[arg(long)]
        project_id: String,
        /// Also generate the CUI-marked checklist document.
        #[arg(long)]
        checklist: bool,
        /// Exit 1 when the CAT1 gate fails.
        #[arg(long)]
        gate: bool,
    },
    /// Analyze a spec file or intake session for clarity.
    Clarify {
        /// Spec file to analyze.
        #[arg(long, conflicts_with = "session_id")]
        spec_file: Option<PathBuf>,
        /// Intake session to analyze.
        #[arg(long)]
        session_id: Option<String>,
        /// Maximum clarification questions.
        #[arg(long, default_value_t = clarify::DEFAULT_MAX_QUESTIONS)]
        max_questions: usize,
    },
    /// Build the requirements traceability matrix.
    Rtm {
        /// Project identifier.
        #[arg(long)]
        project_id: String,
    },
    /// Generate a CycloneDX SBOM.
    Sbom {
        /// Project identifier.
        #[arg(long)]
        project_id: String,
        /// Explicit output path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Apply CUI banners to a document or directory.
    Mark {
        /// File or directory to mark.
        #[arg(long)]
        path: PathBuf,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Server selection for `serve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ServerKind {
    /// Compliance server (assess/report/STIG/SBOM/RTM tools).
    Compliance,
    /// Requirements server (clarification tools).
    Requirements,
}

/// Framework selection argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FrameworkArg {
    /// NIST SP 800-53.
    Nist80053,
    /// FIPS 199/200.
    Fips,
    /// CMMC.
    Cmmc,
    /// FedRAMP.
    Fedramp,
    /// MITRE ATLAS.
    Atlas,
    /// CISA Secure-by-Design.
    Sbd,
    /// IEEE 1012 IV&V.
    Ivv,
    /// CSSP.
    Cssp,
    /// NIST SP 800-207 ZTA.
    Zta,
}

impl From<FrameworkArg> for FrameworkId {
    fn from(arg: FrameworkArg) -> Self {
        match arg {
            FrameworkArg::Nist80053 => Self::Nist80053,
            FrameworkArg::Fips => Self::Fips,
            FrameworkArg::Cmmc => Self::Cmmc,
            FrameworkArg::Fedramp => Self::Fedramp,
            FrameworkArg::Atlas => Self::Atlas,
            FrameworkArg::Sbd => Self::Sbd,
            FrameworkArg::Ivv => Self::Ivv,
            FrameworkArg::Cssp => Self::Cssp,
            FrameworkArg::Zta => Self::Zta,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying the message printed to stderr.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Message printed to stderr before exiting 1.
    message: String,
}

impl CliError {
    /// Builds a CLI error from any displayable cause.
    fn new(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(&error.message),
    }
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve {
            server,
        } => run_serve(&config, server),
        Commands::ProjectCreate {
            project_id,
            name,
            directory,
            classification,
            impact_level,
        } => run_project_create(&config, &project_id, name, directory, classification, &impact_level),
        Commands::Assess {
            project_id,
            framework,
            gate,
        } => run_assess(&config, &project_id, framework.into(), gate),
        Commands::Report {
            project_id,
            framework,
            template,
            output,
            gate,
        } => run_report(&config, &project_id, framework.into(), template, output, gate),
        Commands::Stig {
            project_id,
            checklist,
            gate,
        } => run_stig(&config, &project_id, checklist, gate),
        Commands::Clarify {
            spec_file,
            session_id,
            max_questions,
        } => run_clarify(&config, spec_file, session_id, max_questions),
        Commands::Rtm {
            project_id,
        } => run_rtm(&config, &project_id),
        Commands::Sbom {
            project_id,
            output,
        } => run_sbom(&config, &project_id, output),
        Commands::Mark {
            path,
            dry_run,
        } => run_mark(&config, &path, dry_run),
    }
}

/// Resolves the configuration from flag, environment, or defaults.
fn load_config(flag: Option<&Path>) -> CliResult<MusterConfig> {
    if let Some(path) = flag {
        return MusterConfig::load(path).map_err(CliError::new);
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return MusterConfig::load(Path::new(&path)).map_err(CliError::new);
    }
    Ok(MusterConfig::with_data_dir("data"))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs an MCP server over stdio until EOF.
fn run_serve(config: &MusterConfig, server: ServerKind) -> CliResult<ExitCode> {
    let mut server = match server {
        ServerKind::Compliance => build_compliance_server(config).map_err(CliError::new)?,
        ServerKind::Requirements => build_requirements_server(config).map_err(CliError::new)?,
    };
    match server.serve_stdio() {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            let _ = write_stderr_line(&format!("fatal server loop error: {error}"));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Creates or updates a project record.
fn run_project_create(
    config: &MusterConfig,
    project_id: &str,
    name: String,
    directory: Option<PathBuf>,
    classification: String,
    impact_level: &str,
) -> CliResult<ExitCode> {
    let impact_level = ImpactLevel::parse_label(impact_level)
        .ok_or_else(|| CliError::new(format!("invalid impact level: {impact_level}")))?;
    let store = open_store(config)?;
    let project = Project {
        id: ProjectId::new(project_id),
        name,
        directory_path: directory,
        classification,
        impact_level,
    };
    store.upsert_project(&project).map_err(CliError::new)?;
    write_json(&json!({"status": "success", "project_id": project_id}))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs a framework assessment and prints the summary.
fn run_assess(
    config: &MusterConfig,
    project_id: &str,
    framework: FrameworkId,
    gate: bool,
) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let engine = engine_for(framework);
    let summary = run_assessment(
        &store,
        engine.as_ref(),
        &config.catalog_dir,
        &ProjectId::new(project_id),
        current_timestamp(),
    )
    .map_err(CliError::new)?;
    emit_warnings(&summary.warnings)?;
    write_json(&summary)?;
    Ok(gate_exit_code(gate, &summary.gate_result))
}

/// Generates a framework report and prints the outcome.
fn run_report(
    config: &MusterConfig,
    project_id: &str,
    framework: FrameworkId,
    template: Option<PathBuf>,
    output: Option<PathBuf>,
    gate: bool,
) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let cui_config = CuiConfig::load(config.cui_config_path.as_deref());
    let fallback_dir = config.fallback_output_dir();
    let project_id = ProjectId::new(project_id);
    let options = ReportOptions {
        framework,
        project_id: &project_id,
        catalog_dir: &config.catalog_dir,
        cui: &cui_config,
        template_path: template.as_deref(),
        output_path: output.as_deref(),
        fallback_dir: &fallback_dir,
        now: current_timestamp(),
    };
    let report = generate_report(&store, &options).map_err(CliError::new)?;
    emit_warnings(&report.warnings)?;
    write_json(&json!({
        "status": report.status,
        "output_file": report.output_file.display().to_string(),
        "version": report.version,
        "overall_score": report.summary.overall_score,
        "gate_result": report.summary.gate_result,
    }))?;
    Ok(gate_exit_code(gate, &report.summary.gate_result))
}

/// Runs the STIG checker, optionally emitting the checklist document.
fn run_stig(
    config: &MusterConfig,
    project_id: &str,
    checklist: bool,
    gate: bool,
) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let project_id = ProjectId::new(project_id);
    let summary = run_stig_check(&store, &project_id, current_timestamp()).map_err(CliError::new)?;
    emit_warnings(&summary.warnings)?;
    if checklist {
        let cui_config = CuiConfig::load(config.cui_config_path.as_deref());
        let fallback_dir = config.fallback_output_dir();
        let output = generate_stig_checklist(
            &store,
            &project_id,
            &cui_config,
            None,
            &fallback_dir,
            current_timestamp(),
        )
        .map_err(CliError::new)?;
        emit_warnings(&output.warnings)?;
        write_stderr_line(&format!("checklist written: {}", output.output_file.display()))
            .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    }
    write_json(&summary)?;
    Ok(gate_exit_code(gate, &summary.gate_result))
}

/// Analyzes a spec file or intake session for clarity.
fn run_clarify(
    config: &MusterConfig,
    spec_file: Option<PathBuf>,
    session_id: Option<String>,
    max_questions: usize,
) -> CliResult<ExitCode> {
    let patterns = {
        let path = config.catalog_dir.join("ambiguity_patterns.json");
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
            .map(|document| clarify::load_ambiguity_patterns(&document))
            .unwrap_or_default()
    };
    let analysis = match (spec_file, session_id) {
        (Some(spec_file), None) => {
            let content = std::fs::read_to_string(&spec_file).map_err(|err| {
                CliError::new(format!("spec file not found: {}: {err}", spec_file.display()))
            })?;
            clarify::analyze_spec_text(&content, &patterns, max_questions)
        }
        (None, Some(session_id)) => {
            let store = open_store(config)?;
            let session_id = SessionId::new(session_id);
            store.load_session(&session_id).map_err(CliError::new)?;
            let rows = store.load_requirements(&session_id).map_err(CliError::new)?;
            clarify::analyze_requirement_rows(&rows, &patterns, max_questions)
        }
        _ => {
            return Err(CliError::new("either --spec-file or --session-id is required"));
        }
    };
    write_json(&analysis)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the RTM for a project.
fn run_rtm(config: &MusterConfig, project_id: &str) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let cui_config = CuiConfig::load(config.cui_config_path.as_deref());
    let output = generate_rtm(
        &store,
        &ProjectId::new(project_id),
        &cui_config,
        current_timestamp(),
    )
    .map_err(CliError::new)?;
    emit_warnings(&output.warnings)?;
    write_json(&json!({
        "status": output.status,
        "report_file": output.report_file.display().to_string(),
        "data_file": output.data_file.display().to_string(),
        "coverage": output.coverage,
        "traced_count": output.traced_count,
        "total_requirements": output.total_requirements,
        "gap_count": output.gap_count,
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Generates a CycloneDX SBOM for a project.
fn run_sbom(
    config: &MusterConfig,
    project_id: &str,
    output: Option<PathBuf>,
) -> CliResult<ExitCode> {
    let store = open_store(config)?;
    let fallback_dir = config.fallback_output_dir();
    let result = generate_sbom(
        &store,
        &ProjectId::new(project_id),
        output.as_deref(),
        &fallback_dir,
        current_timestamp(),
    )
    .map_err(CliError::new)?;
    emit_warnings(&result.warnings)?;
    write_json(&json!({
        "status": result.status,
        "output_file": result.output_file.display().to_string(),
        "version": result.version,
        "component_count": result.component_count,
        "detected": result.detected,
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Applies CUI banners to a document or directory.
fn run_mark(config: &MusterConfig, path: &Path, dry_run: bool) -> CliResult<ExitCode> {
    let cui_config = CuiConfig::load(config.cui_config_path.as_deref());
    if path.is_dir() {
        let summary = cui::mark_directory(path, &cui_config, dry_run).map_err(CliError::new)?;
        write_json(&summary)?;
        Ok(ExitCode::SUCCESS)
    } else if path.is_file() {
        let outcome = cui::mark_document(path, &cui_config, dry_run).map_err(CliError::new)?;
        write_json(&json!({"path": path.display().to_string(), "outcome": outcome}))?;
        Ok(ExitCode::SUCCESS)
    } else {
        Err(CliError::new(format!("path not found: {}", path.display())))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens the configured store.
fn open_store(config: &MusterConfig) -> CliResult<SqliteComplianceStore> {
    SqliteComplianceStore::open(&config.store).map_err(CliError::new)
}

/// Maps a gate result to the exit code when `--gate` is set.
fn gate_exit_code(gate: bool, result: &GateResult) -> ExitCode {
    if gate && !result.passed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Writes non-fatal warnings to stderr.
fn emit_warnings(warnings: &[String]) -> CliResult<()> {
    for warning in warnings {
        write_stderr_line(&format!("warning: {warning}"))
            .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
    }
    Ok(())
}

/// Writes pretty JSON output to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("output serialization failed: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
