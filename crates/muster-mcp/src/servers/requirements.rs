// crates/muster-mcp/src/servers/requirements.rs
// ============================================================================
// Module: Requirements Server
// Description: MCP server exposing the clarification engine and intake data.
// Purpose: Wire clarify tools over spec files and intake sessions.
// Dependencies: muster-config, muster-core, muster-store-sqlite
// ============================================================================

//! ## Overview
//! The requirements server exposes the Impact x Uncertainty clarification
//! engine in its two modes: spec-file analysis and intake-session analysis.
//! Session analyses append a best-effort audit event when the session is
//! linked to a project; audit failures never fail the analysis.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use muster_config::MusterConfig;
use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::IntakeStore;
use muster_core::SessionId;
use muster_core::clarify;
use muster_core::clarify::AmbiguityPattern;
use muster_store_sqlite::SqliteComplianceStore;
use serde_json::Value;
use serde_json::json;

use super::BuildError;
use super::current_timestamp;
use crate::registry::HandlerError;
use crate::server::McpServer;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts a required string argument.
fn arg_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, HandlerError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::new(format!("missing required argument: {key}")))
}

/// Extracts the bounded max-questions argument.
fn arg_max_questions(args: &Value) -> usize {
    args.get("max_questions")
        .and_then(Value::as_u64)
        .map_or(clarify::DEFAULT_MAX_QUESTIONS, |value| {
            usize::try_from(value).unwrap_or(clarify::DEFAULT_MAX_QUESTIONS)
        })
}

/// Loads ambiguity patterns from the catalog directory when present.
fn load_patterns(catalog_dir: &Path) -> Vec<AmbiguityPattern> {
    let path = catalog_dir.join("ambiguity_patterns.json");
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    serde_json::from_str::<Value>(&text)
        .map(|document| clarify::load_ambiguity_patterns(&document))
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the requirements MCP server from configuration.
///
/// # Errors
///
/// Returns [`BuildError`] when the store cannot be opened or a registration
/// is invalid.
pub fn build_requirements_server(config: &MusterConfig) -> Result<McpServer, BuildError> {
    let store = Arc::new(SqliteComplianceStore::open(&config.store)?);
    let catalog_dir = config.catalog_dir.clone();
    let mut server = McpServer::new(config.server.name.clone(), config.server.version.clone());

    // ----- clarify_spec -----
    {
        let catalog_dir = catalog_dir.clone();
        server.register_tool(
            "clarify_spec",
            "Analyze a spec file and emit prioritized clarification questions",
            json!({
                "type": "object",
                "properties": {
                    "spec_file": {"type": "string", "description": "Path to the Markdown spec"},
                    "max_questions": {"type": "integer", "minimum": 1},
                },
                "required": ["spec_file"],
            }),
            Box::new(move |args| {
                let spec_file = PathBuf::from(arg_str(args, "spec_file")?);
                let content = std::fs::read_to_string(&spec_file).map_err(|err| {
                    HandlerError::not_found(format!(
                        "spec file not found: {}: {err}",
                        spec_file.display()
                    ))
                })?;
                let patterns = load_patterns(&catalog_dir);
                let analysis =
                    clarify::analyze_spec_text(&content, &patterns, arg_max_questions(args));
                let mut result = serde_json::to_value(&analysis)
                    .map_err(|err| HandlerError::new(err.to_string()))?;
                if let Some(object) = result.as_object_mut() {
                    object.insert(
                        "spec_file".to_string(),
                        json!(spec_file.display().to_string()),
                    );
                }
                Ok(result)
            }),
        )?;
    }

    // ----- clarify_session -----
    {
        let store = Arc::clone(&store);
        let catalog_dir = catalog_dir.clone();
        server.register_tool(
            "clarify_session",
            "Analyze stored intake requirements for an intake session",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {"type": "string", "description": "Intake session identifier"},
                    "max_questions": {"type": "integer", "minimum": 1},
                },
                "required": ["session_id"],
            }),
            Box::new(move |args| {
                let session_id = SessionId::new(arg_str(args, "session_id")?);
                let session = store
                    .load_session(&session_id)
                    .map_err(|err| HandlerError::not_found(err.to_string()))?;
                let rows = store
                    .load_requirements(&session_id)
                    .map_err(|err| HandlerError::new(err.to_string()))?;
                let patterns = load_patterns(&catalog_dir);
                let analysis = clarify::analyze_requirement_rows(
                    &rows,
                    &patterns,
                    arg_max_questions(args),
                );

                // Best-effort audit when the session is linked to a project.
                if let Some(project_id) = session.project_id.clone() {
                    let event = AuditEvent::new(
                        project_id,
                        "clarification_analyzed",
                        format!(
                            "Clarity analysis for session {session_id}: score {:.4}, {} \
                             issues, {} questions",
                            analysis.clarity_score,
                            analysis.total_issues_found,
                            analysis.questions.len()
                        ),
                        json!({
                            "session_id": session_id,
                            "clarity_score": analysis.clarity_score,
                            "issues_found": analysis.total_issues_found,
                        }),
                        current_timestamp(),
                    )
                    .with_actor("muster-requirements-analyst");
                    // A lost audit event must not fail the analysis.
                    let _ = store.append_audit(&event);
                }

                let mut result = serde_json::to_value(&analysis)
                    .map_err(|err| HandlerError::new(err.to_string()))?;
                if let Some(object) = result.as_object_mut() {
                    object.insert("session_id".to_string(), json!(session_id));
                }
                Ok(result)
            }),
        )?;
    }

    // ----- resources -----
    {
        let store = Arc::clone(&store);
        server.register_resource(
            "intake://{session_id}/requirements",
            "Intake requirements",
            "Stored intake requirements for a session",
            "application/json",
            Box::new(move |_uri, captures| {
                let session_id = SessionId::new(
                    captures.get("session_id").map(String::as_str).unwrap_or_default(),
                );
                let rows = store
                    .load_requirements(&session_id)
                    .map_err(|err| HandlerError::new(err.to_string()))?;
                serde_json::to_value(&rows).map_err(|err| HandlerError::new(err.to_string()))
            }),
        )?;
    }

    // ----- prompts -----
    server.register_prompt(
        "clarification_questions",
        "Turn clarification analysis into questions for the stakeholder",
        json!([
            {"name": "session_id", "description": "Intake session identifier", "required": true},
        ]),
        Box::new(|args| {
            let session_id = arg_str(args, "session_id").unwrap_or("the session");
            Ok(json!(format!(
                "Run the clarification analysis for intake session {session_id} and rewrite \
                 the returned questions as a short, polite checklist for the requirement \
                 owner, keeping the priority order."
            )))
        }),
    )?;

    Ok(server)
}
