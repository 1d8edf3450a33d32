// crates/muster-mcp/src/registry/tests.rs
// ============================================================================
// Module: Registry Tests
// Description: Template compilation, matching order, and schema validation.
// Purpose: Pin the resource resolution and registration rules.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

use super::HandlerError;
use super::Registry;
use super::RegistryError;
use super::UriTemplate;

/// Builds a trivial resource handler echoing its captures.
fn echo_resource() -> super::ResourceHandler {
    Box::new(|uri, captures| {
        Ok(json!({
            "uri": uri,
            "captures": captures,
        }))
    })
}

#[test]
fn template_captures_single_segments_only() -> Result<(), RegistryError> {
    let template = UriTemplate::compile("projects://{project_id}/assessments/{framework}")?;
    let captures = template.captures("projects://proj-1/assessments/cmmc");
    let captures = captures.ok_or_else(|| RegistryError::Duplicate("no match".to_string()))?;
    assert_eq!(captures.get("project_id").map(String::as_str), Some("proj-1"));
    assert_eq!(captures.get("framework").map(String::as_str), Some("cmmc"));

    // A capture never spans a path separator.
    assert!(template.captures("projects://a/b/assessments/cmmc").is_none());
    Ok(())
}

#[test]
fn invalid_templates_are_rejected_at_registration() {
    assert!(matches!(
        UriTemplate::compile("catalog://{a/b}"),
        Err(RegistryError::InvalidTemplate { .. })
    ));
    assert!(matches!(
        UriTemplate::compile("catalog://{}"),
        Err(RegistryError::InvalidTemplate { .. })
    ));
    assert!(matches!(
        UriTemplate::compile("catalog://{open"),
        Err(RegistryError::InvalidTemplate { .. })
    ));
    assert!(matches!(
        UriTemplate::compile("catalog://{x}/{x}"),
        Err(RegistryError::InvalidTemplate { .. })
    ));

    let mut registry = Registry::default();
    let result = registry.register_resource(
        "catalog://{a/b}",
        "bad",
        "bad template",
        "application/json",
        echo_resource(),
    );
    assert!(matches!(result, Err(RegistryError::InvalidTemplate { .. })));
}

#[test]
fn exact_match_wins_over_templates() -> Result<(), RegistryError> {
    let mut registry = Registry::default();
    registry.register_resource(
        "catalog://{framework}",
        "catalog",
        "templated",
        "application/json",
        echo_resource(),
    )?;
    registry.register_resource(
        "catalog://index",
        "index",
        "exact",
        "application/json",
        echo_resource(),
    )?;

    let (entry, captures) = registry
        .resolve_resource("catalog://index")
        .ok_or_else(|| RegistryError::Duplicate("no match".to_string()))?;
    assert_eq!(entry.name, "index");
    assert!(captures.is_empty());

    let (entry, captures) = registry
        .resolve_resource("catalog://cmmc")
        .ok_or_else(|| RegistryError::Duplicate("no match".to_string()))?;
    assert_eq!(entry.name, "catalog");
    assert_eq!(captures.get("framework").map(String::as_str), Some("cmmc"));

    assert!(registry.resolve_resource("other://x").is_none());
    Ok(())
}

#[test]
fn tool_schema_validates_arguments() -> Result<(), RegistryError> {
    let mut registry = Registry::default();
    registry.register_tool(
        "echo",
        "Echo tool",
        json!({
            "type": "object",
            "properties": {"msg": {"type": "string"}},
            "required": ["msg"],
        }),
        Box::new(|args: &Value| Ok(json!({"echo": args.get("msg")}))),
    )?;

    let entry = registry
        .tools
        .get("echo")
        .ok_or_else(|| RegistryError::Duplicate("missing echo".to_string()))?;
    assert!(entry.validate_arguments(&json!({"msg": "hi"})).is_none());
    let violation = entry.validate_arguments(&json!({}));
    assert!(violation.is_some_and(|message| message.contains("msg")));

    // Duplicate registration is rejected.
    let duplicate = registry.register_tool(
        "echo",
        "again",
        json!({"type": "object"}),
        Box::new(|_: &Value| Err(HandlerError::new("unused"))),
    );
    assert!(matches!(duplicate, Err(RegistryError::Duplicate(_))));
    Ok(())
}
