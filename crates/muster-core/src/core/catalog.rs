// crates/muster-core/src/core/catalog.rs
// ============================================================================
// Module: Framework Catalogs
// Description: Immutable framework requirement catalogs and their loader.
// Purpose: Parse catalog documents into an indexed, read-only requirement list.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A catalog is a named, versioned, read-only document holding the ordered
//! requirement list for one framework. Catalog documents place their entries
//! under one of several top-level keys (`requirements`, `mitigations`,
//! `techniques`, `controls`, `practices`); the loader accepts any of them.
//! Cross-framework references (NIST control ids, 800-171 ids) are kept as
//! string keys and resolved by indexed lookup, never as object pointers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::RequirementId;
use crate::core::status::AutomationLevel;
use crate::core::status::Priority;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Top-level keys a catalog document may use for its entry array.
const ENTRY_KEYS: [&str; 5] =
    ["requirements", "mitigations", "techniques", "controls", "practices"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog loading errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - A missing or malformed catalog is fatal to the assessment run.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("catalog io error: {0}")]
    Io(String),
    /// Catalog document is not valid JSON.
    #[error("catalog parse error: {0}")]
    Parse(String),
    /// Catalog document is valid JSON but structurally unusable.
    #[error("catalog malformed: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// One requirement entry in a framework catalog.
///
/// # Invariants
/// - `id` is stable across catalog versions.
/// - `grouping` is the framework-specific domain/family/process area label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRequirement {
    /// Stable requirement identifier.
    pub id: RequirementId,
    /// Short requirement title.
    pub title: String,
    /// Full requirement description.
    pub description: String,
    /// Framework-specific grouping (domain, family, or process area).
    pub grouping: String,
    /// Remediation priority.
    pub priority: Priority,
    /// Automation level when declared by the catalog.
    pub automation_level: Option<AutomationLevel>,
    /// NIST 800-53 control cross-references.
    pub nist_controls: Vec<String>,
    /// NIST 800-171 cross-reference (CMMC catalogs).
    pub nist_800_171_id: Option<String>,
    /// ATLAS technique cross-references.
    pub techniques_addressed: Vec<String>,
    /// CISA Secure-by-Design commitment cross-reference.
    pub cisa_commitment: Option<String>,
}

/// A loaded, indexed framework catalog.
///
/// # Invariants
/// - Catalogs are never mutated after load.
/// - `index` maps every requirement id to its position in `requirements`.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Catalog display name.
    pub name: String,
    /// Catalog document version label.
    pub version: String,
    /// Ordered requirement entries.
    pub requirements: Vec<CatalogRequirement>,
    /// Requirement id index into `requirements`.
    index: BTreeMap<RequirementId, usize>,
}

impl Catalog {
    /// Parses a catalog from a raw JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the document is not a JSON object, has
    /// no recognized entry array, or contains an entry without an `id`.
    pub fn from_json(document: &Value) -> Result<Self, CatalogError> {
        let object = document
            .as_object()
            .ok_or_else(|| CatalogError::Malformed("document is not a JSON object".to_string()))?;
        let entries = ENTRY_KEYS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))
            .ok_or_else(|| {
                CatalogError::Malformed(format!(
                    "no entry array found under any of: {}",
                    ENTRY_KEYS.join(", ")
                ))
            })?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("unnamed catalog")
            .to_string();
        let version =
            object.get("version").and_then(Value::as_str).unwrap_or("1.0").to_string();
        let mut requirements = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            requirements.push(parse_entry(entry, position)?);
        }
        let mut index = BTreeMap::new();
        for (position, requirement) in requirements.iter().enumerate() {
            index.insert(requirement.id.clone(), position);
        }
        Ok(Self {
            name,
            version,
            requirements,
            index,
        })
    }

    /// Parses a catalog from raw document text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the text is not valid JSON or the
    /// document is structurally unusable.
    pub fn from_text(text: &str) -> Result<Self, CatalogError> {
        let document: Value =
            serde_json::from_str(text).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::from_json(&document)
    }

    /// Looks up a requirement by id.
    #[must_use]
    pub fn requirement(&self, id: &RequirementId) -> Option<&CatalogRequirement> {
        self.index.get(id).and_then(|position| self.requirements.get(*position))
    }

    /// Returns the distinct grouping labels in first-seen order.
    #[must_use]
    pub fn groupings(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for requirement in &self.requirements {
            if !seen.contains(&requirement.grouping) {
                seen.push(requirement.grouping.clone());
            }
        }
        seen
    }
}

// ============================================================================
// SECTION: Entry Parsing
// ============================================================================

/// Parses one catalog entry, tolerating framework-specific field spellings.
fn parse_entry(entry: &Value, position: usize) -> Result<CatalogRequirement, CatalogError> {
    let object = entry.as_object().ok_or_else(|| {
        CatalogError::Malformed(format!("entry {position} is not a JSON object"))
    })?;
    let id = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::Malformed(format!("entry {position} is missing an id")))?;
    let title = object
        .get("title")
        .or_else(|| object.get("name"))
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string();
    let description =
        object.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
    let grouping = ["domain", "family", "process_area", "category", "pillar"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or("general")
        .to_string();
    let priority = object
        .get("priority")
        .and_then(Value::as_str)
        .and_then(Priority::parse_label)
        .unwrap_or(Priority::Medium);
    let automation_level = object
        .get("automation_level")
        .and_then(Value::as_str)
        .and_then(AutomationLevel::parse_label);
    let nist_controls = string_array(object.get("nist_controls"));
    let nist_800_171_id =
        object.get("nist_800_171_id").and_then(Value::as_str).map(ToString::to_string);
    let techniques_addressed = string_array(object.get("techniques_addressed"));
    let cisa_commitment =
        object.get("cisa_commitment").and_then(Value::as_str).map(ToString::to_string);
    Ok(CatalogRequirement {
        id: RequirementId::new(id),
        title,
        description,
        grouping,
        priority,
        automation_level,
        nist_controls,
        nist_800_171_id,
        techniques_addressed,
        cisa_commitment,
    })
}

/// Extracts an optional array of strings, dropping non-string members.
fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items.iter().filter_map(Value::as_str).map(ToString::to_string).collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
