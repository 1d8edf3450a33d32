// crates/muster-mcp/src/servers/compliance.rs
// ============================================================================
// Module: Compliance Server
// Description: MCP server exposing assessors, reports, STIG, SBOM, and RTM.
// Purpose: Wire compliance tool handlers over the shared store.
// Dependencies: muster-config, muster-core, muster-frameworks, muster-reports
// ============================================================================

//! ## Overview
//! The compliance server registers the assessment and reporting tool
//! surface. Not-found conditions (project, catalog, session) come back as
//! domain errors inside the tool result envelope; only malformed requests
//! become JSON-RPC errors. Gate failures are ordinary results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use muster_config::MusterConfig;
use muster_core::ComplianceStore;
use muster_core::FrameworkId;
use muster_core::ImpactLevel;
use muster_core::Project;
use muster_core::ProjectId;
use muster_frameworks::AssessError;
use muster_frameworks::engine_for;
use muster_frameworks::run_assessment;
use muster_frameworks::run_stig_check;
use muster_reports::CuiConfig;
use muster_reports::cui;
use muster_reports::generate_report;
use muster_reports::generate_rtm;
use muster_reports::generate_sbom;
use muster_reports::generate_stig_checklist;
use muster_reports::generator::ReportError;
use muster_reports::generator::ReportOptions;
use muster_reports::rtm::RtmError;
use muster_reports::sbom::SbomError;
use muster_reports::stig_report::StigReportError;
use muster_store_sqlite::SqliteComplianceStore;
use serde_json::Value;
use serde_json::json;

use super::BuildError;
use super::current_timestamp;
use crate::registry::HandlerError;
use crate::server::McpServer;

// ============================================================================
// SECTION: Argument Helpers
// ============================================================================

/// Extracts a required string argument.
fn arg_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, HandlerError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::new(format!("missing required argument: {key}")))
}

/// Extracts an optional string argument.
fn arg_str_opt<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Parses the framework argument.
fn arg_framework(args: &Value) -> Result<FrameworkId, HandlerError> {
    let label = arg_str(args, "framework")?;
    FrameworkId::parse(label)
        .ok_or_else(|| HandlerError::not_found(format!("unknown framework: {label}")))
}

/// Serializes a tool result value, mapping failures to handler errors.
fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, HandlerError> {
    serde_json::to_value(value)
        .map_err(|err| HandlerError::new(format!("result serialization failed: {err}")))
}

/// Maps assessment errors onto envelope semantics.
fn map_assess_error(error: AssessError) -> HandlerError {
    match error {
        AssessError::NotFound(message) => HandlerError::not_found(message),
        AssessError::Catalog(error) => HandlerError::not_found(error.to_string()),
        AssessError::Store(error) => HandlerError::new(error.to_string()),
    }
}

/// Maps report errors onto envelope semantics.
fn map_report_error(error: ReportError) -> HandlerError {
    match error {
        ReportError::NotFound(message) => HandlerError::not_found(message),
        ReportError::Catalog(error) => HandlerError::not_found(error.to_string()),
        other => HandlerError::new(other.to_string()),
    }
}

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Schema for tools taking only a project id.
fn project_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "project_id": {"type": "string", "description": "Project identifier"},
        },
        "required": ["project_id"],
    })
}

/// Schema for tools taking a project id and framework.
fn project_framework_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "project_id": {"type": "string", "description": "Project identifier"},
            "framework": {
                "type": "string",
                "description": "Framework id (nist_800_53, fips, cmmc, fedramp, atlas, sbd, ivv, cssp, zta)",
            },
        },
        "required": ["project_id", "framework"],
    })
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the compliance MCP server from configuration.
///
/// # Errors
///
/// Returns [`BuildError`] when the store cannot be opened or a registration
/// is invalid.
#[allow(
    clippy::too_many_lines,
    reason = "Registration reads as one linear wiring table."
)]
pub fn build_compliance_server(config: &MusterConfig) -> Result<McpServer, BuildError> {
    let store = Arc::new(SqliteComplianceStore::open(&config.store)?);
    let cui_config = CuiConfig::load(config.cui_config_path.as_deref());
    let catalog_dir = config.catalog_dir.clone();
    let fallback_dir = config.fallback_output_dir();
    let mut server = McpServer::new(config.server.name.clone(), config.server.version.clone());

    // ----- project_create -----
    {
        let store = Arc::clone(&store);
        server.register_tool(
            "project_create",
            "Create or update a project record",
            json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "name": {"type": "string"},
                    "directory_path": {"type": "string"},
                    "classification": {"type": "string"},
                    "impact_level": {"type": "string", "enum": ["IL2", "IL4", "IL5", "IL6"]},
                },
                "required": ["project_id", "name"],
            }),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let impact_level = arg_str_opt(args, "impact_level")
                    .and_then(ImpactLevel::parse_label)
                    .unwrap_or(ImpactLevel::Il4);
                let project = Project {
                    id: project_id.clone(),
                    name: arg_str(args, "name")?.to_string(),
                    directory_path: arg_str_opt(args, "directory_path").map(PathBuf::from),
                    classification: arg_str_opt(args, "classification")
                        .unwrap_or("CUI")
                        .to_string(),
                    impact_level,
                };
                store
                    .upsert_project(&project)
                    .map_err(|err| HandlerError::new(err.to_string()))?;
                Ok(json!({"status": "success", "project_id": project_id}))
            }),
        )?;
    }

    // ----- project_get -----
    {
        let store = Arc::clone(&store);
        server.register_tool(
            "project_get",
            "Load a project record",
            project_schema(),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let project = store
                    .load_project(&project_id)
                    .map_err(|err| HandlerError::not_found(err.to_string()))?;
                to_value(&project)
            }),
        )?;
    }

    // ----- assess_run -----
    {
        let store = Arc::clone(&store);
        let catalog_dir = catalog_dir.clone();
        server.register_tool(
            "assess_run",
            "Run a framework assessment over the project catalog",
            project_framework_schema(),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let framework = arg_framework(args)?;
                let engine = engine_for(framework);
                let summary = run_assessment(
                    store.as_ref(),
                    engine.as_ref(),
                    &catalog_dir,
                    &project_id,
                    current_timestamp(),
                )
                .map_err(map_assess_error)?;
                to_value(&summary)
            }),
        )?;
    }

    // ----- report_generate -----
    {
        let store = Arc::clone(&store);
        let catalog_dir = catalog_dir.clone();
        let fallback_dir = fallback_dir.clone();
        let cui_config = cui_config.clone();
        server.register_tool(
            "report_generate",
            "Generate the CUI-marked framework assessment report",
            json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "framework": {"type": "string"},
                    "template_path": {"type": "string"},
                    "output_path": {"type": "string"},
                },
                "required": ["project_id", "framework"],
            }),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let framework = arg_framework(args)?;
                let template_path = arg_str_opt(args, "template_path").map(PathBuf::from);
                let output_path = arg_str_opt(args, "output_path").map(PathBuf::from);
                let options = ReportOptions {
                    framework,
                    project_id: &project_id,
                    catalog_dir: &catalog_dir,
                    cui: &cui_config,
                    template_path: template_path.as_deref(),
                    output_path: output_path.as_deref(),
                    fallback_dir: &fallback_dir,
                    now: current_timestamp(),
                };
                let output =
                    generate_report(store.as_ref(), &options).map_err(map_report_error)?;
                Ok(json!({
                    "status": output.status,
                    "output_file": output.output_file.display().to_string(),
                    "version": output.version,
                    "summary": to_value(&output.summary)?,
                    "gate_result": to_value(&output.summary.gate_result)?,
                    "warnings": output.warnings,
                }))
            }),
        )?;
    }

    // ----- stig_check -----
    {
        let store = Arc::clone(&store);
        server.register_tool(
            "stig_check",
            "Run the web-application STIG checklist against the project",
            project_schema(),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let summary =
                    run_stig_check(store.as_ref(), &project_id, current_timestamp())
                        .map_err(map_assess_error)?;
                to_value(&summary)
            }),
        )?;
    }

    // ----- stig_report -----
    {
        let store = Arc::clone(&store);
        let fallback_dir = fallback_dir.clone();
        let cui_config = cui_config.clone();
        server.register_tool(
            "stig_report",
            "Generate the CUI-marked STIG checklist document",
            project_schema(),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let output = generate_stig_checklist(
                    store.as_ref(),
                    &project_id,
                    &cui_config,
                    None,
                    &fallback_dir,
                    current_timestamp(),
                )
                .map_err(|err| match err {
                    StigReportError::NotFound(message) => HandlerError::not_found(message),
                    other => HandlerError::new(other.to_string()),
                })?;
                Ok(json!({
                    "status": output.status,
                    "output_file": output.output_file.display().to_string(),
                    "version": output.version,
                    "cat1_open": output.cat1_open,
                    "gate_result": to_value(&output.gate_result)?,
                    "warnings": output.warnings,
                }))
            }),
        )?;
    }

    // ----- sbom_generate -----
    {
        let store = Arc::clone(&store);
        let fallback_dir = fallback_dir.clone();
        server.register_tool(
            "sbom_generate",
            "Generate a CycloneDX 1.4 SBOM for the project",
            json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "output_path": {"type": "string"},
                },
                "required": ["project_id"],
            }),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let output_path = arg_str_opt(args, "output_path").map(PathBuf::from);
                let output = generate_sbom(
                    store.as_ref(),
                    &project_id,
                    output_path.as_deref(),
                    &fallback_dir,
                    current_timestamp(),
                )
                .map_err(|err| match err {
                    SbomError::NotFound(message) => HandlerError::not_found(message),
                    other => HandlerError::new(other.to_string()),
                })?;
                Ok(json!({
                    "status": output.status,
                    "output_file": output.output_file.display().to_string(),
                    "version": output.version,
                    "component_count": output.component_count,
                    "detected": output.detected,
                    "warnings": output.warnings,
                }))
            }),
        )?;
    }

    // ----- rtm_generate -----
    {
        let store = Arc::clone(&store);
        let cui_config = cui_config.clone();
        server.register_tool(
            "rtm_generate",
            "Build the requirements traceability matrix for the project",
            project_schema(),
            Box::new(move |args| {
                let project_id = ProjectId::new(arg_str(args, "project_id")?);
                let output = generate_rtm(
                    store.as_ref(),
                    &project_id,
                    &cui_config,
                    current_timestamp(),
                )
                .map_err(|err| match err {
                    RtmError::NotFound(message) | RtmError::InvalidTarget(message) => {
                        HandlerError::not_found(message)
                    }
                    other => HandlerError::new(other.to_string()),
                })?;
                Ok(json!({
                    "status": output.status,
                    "report_file": output.report_file.display().to_string(),
                    "data_file": output.data_file.display().to_string(),
                    "coverage": output.coverage,
                    "traced_count": output.traced_count,
                    "total_requirements": output.total_requirements,
                    "gap_count": output.gap_count,
                    "warnings": output.warnings,
                }))
            }),
        )?;
    }

    // ----- cui_mark -----
    {
        let cui_config = cui_config.clone();
        server.register_tool(
            "cui_mark",
            "Apply CUI banners to a document or directory of documents",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "dry_run": {"type": "boolean"},
                },
                "required": ["path"],
            }),
            Box::new(move |args| {
                let path = PathBuf::from(arg_str(args, "path")?);
                let dry_run = args.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
                if path.is_dir() {
                    let summary = cui::mark_directory(&path, &cui_config, dry_run)
                        .map_err(|err| HandlerError::new(err.to_string()))?;
                    to_value(&summary)
                } else if path.is_file() {
                    let outcome = cui::mark_document(&path, &cui_config, dry_run)
                        .map_err(|err| HandlerError::new(err.to_string()))?;
                    Ok(json!({"path": path.display().to_string(), "outcome": to_value(&outcome)?}))
                } else {
                    Err(HandlerError::not_found(format!("path not found: {}", path.display())))
                }
            }),
        )?;
    }

    // ----- resources -----
    {
        let catalog_dir = catalog_dir.clone();
        server.register_resource(
            "catalog://{framework}",
            "Framework catalog",
            "Raw framework catalog document by framework id",
            "application/json",
            Box::new(move |_uri, captures| {
                let label = captures
                    .get("framework")
                    .map(String::as_str)
                    .unwrap_or_default();
                let framework = FrameworkId::parse(label)
                    .ok_or_else(|| HandlerError::new(format!("unknown framework: {label}")))?;
                let path = catalog_dir.join(engine_for(framework).catalog_filename());
                std::fs::read_to_string(&path)
                    .map(Value::String)
                    .map_err(|err| HandlerError::new(format!("{}: {err}", path.display())))
            }),
        )?;
    }
    {
        let store = Arc::clone(&store);
        server.register_resource(
            "projects://{project_id}",
            "Project record",
            "Registered project record by id",
            "application/json",
            Box::new(move |_uri, captures| {
                let project_id = ProjectId::new(
                    captures.get("project_id").map(String::as_str).unwrap_or_default(),
                );
                let project = store
                    .load_project(&project_id)
                    .map_err(|err| HandlerError::new(err.to_string()))?;
                to_value(&project)
            }),
        )?;
    }

    // ----- prompts -----
    server.register_prompt(
        "assessment_summary",
        "Summarize the current assessment posture for a project",
        json!([
            {"name": "project_id", "description": "Project identifier", "required": true},
            {"name": "framework", "description": "Framework id", "required": true},
        ]),
        Box::new(|args| {
            let project_id = arg_str_opt(args, "project_id").unwrap_or("the project");
            let framework = arg_str_opt(args, "framework").unwrap_or("the framework");
            Ok(json!(format!(
                "Review the stored {framework} assessment rows for {project_id}. Summarize \
                 the overall score, posture, and gate result, then list the three highest \
                 priority unsatisfied requirements with their remediation windows."
            )))
        }),
    )?;
    server.register_prompt(
        "gap_review",
        "Draft a gap review agenda from the latest assessment",
        json!([
            {"name": "project_id", "description": "Project identifier", "required": true},
            {"name": "framework", "description": "Framework id", "required": true},
        ]),
        Box::new(|args| {
            let project_id = arg_str_opt(args, "project_id").unwrap_or("the project");
            let framework = arg_str_opt(args, "framework").unwrap_or("the framework");
            Ok(json!(format!(
                "Prepare a gap review agenda for {project_id} under {framework}: group the \
                 not_satisfied and not_assessed requirements by {framework} grouping, note \
                 the evidence already collected, and propose owners for each remediation \
                 window."
            )))
        }),
    )?;

    Ok(server)
}
