// crates/muster-core/src/core/identifiers.rs
// ============================================================================
// Module: Muster Identifiers
// Description: Canonical opaque identifiers for projects, sessions, and rows.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout Muster.
//! String identifiers are opaque and serialize transparently on the wire.
//! [`FrameworkId`] is a closed enum: the set of supported compliance
//! frameworks is fixed at compile time and each variant carries a stable
//! snake_case wire label.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: String Identifiers
// ============================================================================

/// Project identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a new project identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Requirements-intake session identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalog requirement identifier (stable within a framework catalog).
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is scoped to one framework catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(String);

impl RequirementId {
    /// Creates a new requirement identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RequirementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Finding identifier (e.g. a STIG vulnerability id such as `V-222635`).
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is scoped to one project's finding set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingId(String);

impl FindingId {
    /// Creates a new finding identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Framework Identifier
// ============================================================================

/// Supported compliance framework identifiers.
///
/// # Invariants
/// - Wire labels are stable snake_case strings used as catalog keys,
///   assessment table prefixes, and audit event type prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrameworkId {
    /// NIST SP 800-53 control catalog.
    #[serde(rename = "nist_800_53")]
    Nist80053,
    /// FIPS 199 categorization / FIPS 200 minimum security requirements.
    #[serde(rename = "fips")]
    Fips,
    /// CMMC practice model.
    #[serde(rename = "cmmc")]
    Cmmc,
    /// FedRAMP control baseline.
    #[serde(rename = "fedramp")]
    Fedramp,
    /// MITRE ATLAS adversarial-ML mitigations.
    #[serde(rename = "atlas")]
    Atlas,
    /// CISA Secure-by-Design commitments.
    #[serde(rename = "sbd")]
    Sbd,
    /// IEEE 1012 independent verification and validation.
    #[serde(rename = "ivv")]
    Ivv,
    /// Cybersecurity Service Provider requirements.
    #[serde(rename = "cssp")]
    Cssp,
    /// NIST SP 800-207 Zero Trust Architecture.
    #[serde(rename = "zta")]
    Zta,
}

impl FrameworkId {
    /// All supported frameworks in canonical order.
    pub const ALL: [Self; 9] = [
        Self::Nist80053,
        Self::Fips,
        Self::Cmmc,
        Self::Fedramp,
        Self::Atlas,
        Self::Sbd,
        Self::Ivv,
        Self::Cssp,
        Self::Zta,
    ];

    /// Returns the stable wire label for the framework.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nist80053 => "nist_800_53",
            Self::Fips => "fips",
            Self::Cmmc => "cmmc",
            Self::Fedramp => "fedramp",
            Self::Atlas => "atlas",
            Self::Sbd => "sbd",
            Self::Ivv => "ivv",
            Self::Cssp => "cssp",
            Self::Zta => "zta",
        }
    }

    /// Returns the human-readable framework name for report headers.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Nist80053 => "NIST SP 800-53",
            Self::Fips => "FIPS 199/200",
            Self::Cmmc => "CMMC",
            Self::Fedramp => "FedRAMP",
            Self::Atlas => "MITRE ATLAS",
            Self::Sbd => "CISA Secure-by-Design",
            Self::Ivv => "IEEE 1012 IV&V",
            Self::Cssp => "CSSP",
            Self::Zta => "NIST SP 800-207 (Zero Trust Architecture)",
        }
    }

    /// Parses a wire label into a framework identifier.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|framework| framework.as_str() == label)
    }
}

impl fmt::Display for FrameworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
