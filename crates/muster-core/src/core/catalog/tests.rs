// crates/muster-core/src/core/catalog/tests.rs
// ============================================================================
// Module: Catalog Tests
// Description: Loader behavior across entry-key spellings and malformed input.
// Purpose: Ensure catalog parsing is tolerant where specified and fatal otherwise.
// Dependencies: serde_json
// ============================================================================

use serde_json::json;

use super::Catalog;
use super::CatalogError;
use crate::core::identifiers::RequirementId;
use crate::core::status::AutomationLevel;
use crate::core::status::Priority;

#[test]
fn loads_practices_key_and_synonyms() -> Result<(), CatalogError> {
    let document = json!({
        "name": "CMMC Practices",
        "version": "2.0",
        "practices": [
            {
                "id": "AC.L2-3.1.1",
                "name": "Limit system access",
                "description": "Limit access to authorized users.",
                "domain": "AC",
                "priority": "critical",
                "automation_level": "semi",
                "nist_800_171_id": "3.1.1",
                "nist_controls": ["AC-2", "AC-3"]
            },
            {
                "id": "AU.L2-3.3.1",
                "title": "Create audit records",
                "family": "AU"
            }
        ]
    });
    let catalog = Catalog::from_json(&document)?;
    assert_eq!(catalog.name, "CMMC Practices");
    assert_eq!(catalog.version, "2.0");
    assert_eq!(catalog.requirements.len(), 2);

    let first = catalog
        .requirement(&RequirementId::new("AC.L2-3.1.1"))
        .ok_or_else(|| CatalogError::Malformed("missing AC.L2-3.1.1".to_string()))?;
    assert_eq!(first.title, "Limit system access");
    assert_eq!(first.grouping, "AC");
    assert_eq!(first.priority, Priority::Critical);
    assert_eq!(first.automation_level, Some(AutomationLevel::Semi));
    assert_eq!(first.nist_controls, vec!["AC-2".to_string(), "AC-3".to_string()]);
    assert_eq!(first.nist_800_171_id.as_deref(), Some("3.1.1"));

    let second = catalog
        .requirement(&RequirementId::new("AU.L2-3.3.1"))
        .ok_or_else(|| CatalogError::Malformed("missing AU.L2-3.3.1".to_string()))?;
    assert_eq!(second.grouping, "AU");
    assert_eq!(second.priority, Priority::Medium);
    Ok(())
}

#[test]
fn missing_entry_array_is_malformed() {
    let document = json!({"name": "empty", "rows": []});
    let result = Catalog::from_json(&document);
    assert!(matches!(result, Err(CatalogError::Malformed(_))));
}

#[test]
fn entry_without_id_is_malformed() {
    let document = json!({"requirements": [{"title": "no id"}]});
    let result = Catalog::from_json(&document);
    assert!(matches!(result, Err(CatalogError::Malformed(_))));
}

#[test]
fn invalid_json_text_is_parse_error() {
    let result = Catalog::from_text("{not json");
    assert!(matches!(result, Err(CatalogError::Parse(_))));
}

#[test]
fn groupings_preserve_first_seen_order() -> Result<(), CatalogError> {
    let document = json!({
        "controls": [
            {"id": "SC-7", "family": "SC"},
            {"id": "AC-2", "family": "AC"},
            {"id": "SC-8", "family": "SC"}
        ]
    });
    let catalog = Catalog::from_json(&document)?;
    assert_eq!(catalog.groupings(), vec!["SC".to_string(), "AC".to_string()]);
    Ok(())
}
