// crates/muster-core/src/core/finding.rs
// ============================================================================
// Module: Finding Records
// Description: Derived per-finding records for STIG and IV&V checks.
// Purpose: Carry severity, status, evidence, and remediation text per finding.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Findings are derived records produced by deterministic checkers (STIG
//! rules, IV&V analysis). Unlike assessment rows they are keyed by a finding
//! identifier rather than a catalog requirement, and they carry remediation
//! fix text for report rendering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::FindingId;
use crate::core::identifiers::ProjectId;
use crate::core::status::FindingStatus;
use crate::core::status::StigSeverity;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Finding
// ============================================================================

/// One derived finding for a project.
///
/// # Invariants
/// - `(project_id, finding_id)` identifies the finding; re-checks overwrite in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Owning project identifier.
    pub project_id: ProjectId,
    /// Stable finding identifier (e.g. `V-222635`).
    pub finding_id: FindingId,
    /// Rule identifier the finding was derived from.
    pub rule_id: String,
    /// Finding severity category.
    pub severity: StigSeverity,
    /// Short finding title.
    pub title: String,
    /// Current finding status.
    pub status: FindingStatus,
    /// Evidence text collected by the check.
    pub evidence: String,
    /// Remediation fix text.
    pub fix_text: String,
    /// Timestamp of the last check run.
    pub updated_at: Timestamp,
}
