// crates/muster-mcp/tests/server_workflows.rs
// ============================================================================
// Module: Server Workflow Tests
// Description: End-to-end tool flows over the concrete MCP servers.
// Purpose: Exercise project, assessment, and clarification tools together.
// Dependencies: muster-config, muster-mcp, serde_json, tempfile
// ============================================================================

//! End-to-end tool invocations through the dispatch core, backed by a real
//! store and catalog directory.

use muster_config::MusterConfig;
use muster_mcp::build_compliance_server;
use muster_mcp::build_requirements_server;
use serde_json::Value;
use serde_json::json;

/// Builds a config rooted at a temp dir with a minimal ZTA catalog.
fn config_with_catalogs(dir: &std::path::Path) -> Result<MusterConfig, Box<dyn std::error::Error>> {
    let catalog_dir = dir.join("catalogs");
    std::fs::create_dir_all(&catalog_dir)?;
    let catalog = json!({
        "name": "Zero Trust Architecture",
        "requirements": [
            {"id": "ZTA-NET-1", "title": "Micro-segmentation", "pillar": "network",
             "priority": "critical"},
            {"id": "ZTA-NET-2", "title": "Mutual TLS", "pillar": "network"}
        ]
    });
    std::fs::write(catalog_dir.join("nist_800_207_zta.json"), catalog.to_string())?;
    Ok(MusterConfig::with_data_dir(dir))
}

/// Issues one request and parses the tool-call envelope text as JSON.
fn call_tool(
    server: &mut muster_mcp::McpServer,
    id: u64,
    name: &str,
    arguments: Value,
) -> Result<(bool, Value), Box<dyn std::error::Error>> {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
    });
    let response = server.handle_message(&request).ok_or("expected a response")?;
    let result = response.get("result").ok_or_else(|| {
        format!("expected result, got error: {}", response.get("error").unwrap_or(&Value::Null))
    })?;
    let is_error = result["isError"].as_bool().ok_or("missing isError")?;
    let text = result["content"][0]["text"].as_str().ok_or("missing content text")?;
    Ok((is_error, serde_json::from_str(text)?))
}

#[test]
fn compliance_flow_creates_assesses_and_reports() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_catalogs(dir.path())?;
    let mut server = build_compliance_server(&config)?;

    // Create a project with a scannable directory carrying mTLS config.
    let project_dir = dir.path().join("workload");
    std::fs::create_dir_all(&project_dir)?;
    std::fs::write(
        project_dir.join("mesh.yaml"),
        "kind: PeerAuthentication\nspec:\n  mtls:\n    mode: STRICT\n",
    )?;
    let (is_error, created) = call_tool(
        &mut server,
        1,
        "project_create",
        json!({
            "project_id": "proj-1",
            "name": "Workload",
            "directory_path": project_dir.display().to_string(),
            "impact_level": "IL4",
        }),
    )?;
    assert!(!is_error);
    assert_eq!(created["status"], json!("success"));

    // Assess against the ZTA catalog; the mTLS scan satisfies ZTA-NET-2.
    let (is_error, summary) = call_tool(
        &mut server,
        2,
        "assess_run",
        json!({"project_id": "proj-1", "framework": "zta"}),
    )?;
    assert!(!is_error);
    assert_eq!(summary["total_requirements"], json!(2));
    assert_eq!(summary["status_counts"]["satisfied"], json!(1));
    assert_eq!(summary["status_counts"]["not_assessed"], json!(1));
    // The critical requirement is unassessed, not unsatisfied: gate passes.
    assert_eq!(summary["gate_result"]["passed"], json!(true));

    // Generate the report; the gate section and version render.
    let (is_error, report) = call_tool(
        &mut server,
        3,
        "report_generate",
        json!({"project_id": "proj-1", "framework": "zta"}),
    )?;
    assert!(!is_error);
    assert_eq!(report["version"], json!("1.0"));
    let output_file = report["output_file"].as_str().ok_or("missing output_file")?;
    let markdown = std::fs::read_to_string(output_file)?;
    assert!(markdown.contains("## Security Gate Evaluation"));
    assert!(markdown.contains("CUI // SP-CTI"));

    // Unknown project surfaces a not_found envelope, not a JSON-RPC error.
    let (is_error, missing) =
        call_tool(&mut server, 4, "project_get", json!({"project_id": "absent"}))?;
    assert!(is_error);
    assert_eq!(missing["status"], json!("not_found"));
    Ok(())
}

#[test]
fn requirements_flow_clarifies_a_vague_spec() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_catalogs(dir.path())?;
    let mut server = build_requirements_server(&config)?;

    let spec_path = dir.path().join("vague.md");
    std::fs::write(&spec_path, "## Feature Description\nWe need to do something.\n")?;

    let (is_error, analysis) = call_tool(
        &mut server,
        1,
        "clarify_spec",
        json!({"spec_file": spec_path.display().to_string()}),
    )?;
    assert!(!is_error);
    assert_eq!(analysis["status"], json!("ok"));
    let questions = analysis["questions"].as_array().ok_or("missing questions")?;
    assert!(!questions.is_empty());
    assert!(questions.iter().any(|question| {
        question["section"] == json!("Feature Description")
            && question["impact"] == json!("enhancement")
            && question["uncertainty"] == json!("unknown")
            && question["priority"] == json!(3)
    }));

    // A missing spec file is a not_found envelope.
    let (is_error, missing) = call_tool(
        &mut server,
        2,
        "clarify_spec",
        json!({"spec_file": dir.path().join("absent.md").display().to_string()}),
    )?;
    assert!(is_error);
    assert_eq!(missing["status"], json!("not_found"));

    // An unknown session id is a not_found envelope too.
    let (is_error, missing) =
        call_tool(&mut server, 3, "clarify_session", json!({"session_id": "sess-x"}))?;
    assert!(is_error);
    assert_eq!(missing["status"], json!("not_found"));
    Ok(())
}

#[test]
fn servers_advertise_their_tool_surfaces() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = config_with_catalogs(dir.path())?;
    let mut server = build_compliance_server(&config)?;

    let response = server
        .handle_message(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .ok_or("expected a response")?;
    let tools = response["result"]["tools"].as_array().ok_or("missing tools")?;
    let names: Vec<&str> =
        tools.iter().filter_map(|tool| tool["name"].as_str()).collect();
    for expected in [
        "assess_run",
        "cui_mark",
        "project_create",
        "project_get",
        "report_generate",
        "rtm_generate",
        "sbom_generate",
        "stig_check",
        "stig_report",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }

    let response = server
        .handle_message(&json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}))
        .ok_or("expected a response")?;
    let resources = response["result"]["resources"].as_array().ok_or("missing resources")?;
    assert!(resources.iter().any(|r| r["uri"] == json!("catalog://{framework}")));
    assert!(resources.iter().any(|r| r["uri"] == json!("projects://{project_id}")));

    let response = server
        .handle_message(&json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/list"}))
        .ok_or("expected a response")?;
    let prompts = response["result"]["prompts"].as_array().ok_or("missing prompts")?;
    assert!(prompts.iter().any(|p| p["name"] == json!("assessment_summary")));
    Ok(())
}
