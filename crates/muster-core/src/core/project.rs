// crates/muster-core/src/core/project.rs
// ============================================================================
// Module: Project Records
// Description: Project identity, directory, classification, and impact level.
// Purpose: Carry the project attributes assessors and reports depend on.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A project is the unit of ownership in Muster: it exclusively owns its
//! assessment rows, findings, and audit events. Projects are created before
//! any assessment runs and are never deleted by the core.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ProjectId;

// ============================================================================
// SECTION: Impact Level
// ============================================================================

/// DoD impact level of the project environment.
///
/// # Invariants
/// - Wire labels are the uppercase `IL*` forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImpactLevel {
    /// Impact Level 2 (public-releasable and non-critical mission data).
    #[serde(rename = "IL2")]
    Il2,
    /// Impact Level 4 (CUI).
    #[serde(rename = "IL4")]
    Il4,
    /// Impact Level 5 (higher-sensitivity CUI and NSS).
    #[serde(rename = "IL5")]
    Il5,
    /// Impact Level 6 (classified up to SECRET).
    #[serde(rename = "IL6")]
    Il6,
}

impl ImpactLevel {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Il2 => "IL2",
            Self::Il4 => "IL4",
            Self::Il5 => "IL5",
            Self::Il6 => "IL6",
        }
    }

    /// Parses a wire label into an impact level.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "IL2" => Some(Self::Il2),
            "IL4" => Some(Self::Il4),
            "IL5" => Some(Self::Il5),
            "IL6" => Some(Self::Il6),
            _ => None,
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Project
// ============================================================================

/// A registered project.
///
/// # Invariants
/// - `id` is stable for the project's lifetime.
/// - `directory_path` may be absent; assessors then run catalog-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Stable project identifier.
    pub id: ProjectId,
    /// Human-readable project name.
    pub name: String,
    /// On-disk project directory when known.
    pub directory_path: Option<PathBuf>,
    /// Classification label applied to project artifacts.
    pub classification: String,
    /// DoD impact level of the target environment.
    pub impact_level: ImpactLevel,
}

impl Project {
    /// Returns the classification label, defaulting to `CUI` when empty.
    #[must_use]
    pub fn classification_label(&self) -> &str {
        if self.classification.is_empty() { "CUI" } else { &self.classification }
    }
}
