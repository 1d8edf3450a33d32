// crates/muster-core/src/interfaces/mod.rs
// ============================================================================
// Module: Muster Interfaces
// Description: Backend-agnostic interfaces for compliance and intake storage.
// Purpose: Define the contract surfaces used by assessors, reports, and servers.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Muster integrates with storage backends without
//! embedding backend-specific details. Implementations must be deterministic
//! and fail closed on missing or invalid data. Assessment writes pair the row
//! mutations with their audit event in one transaction; standalone audit
//! appends are best-effort at the call sites that use them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::audit::AuditEvent;
use crate::core::finding::Finding;
use crate::core::identifiers::FrameworkId;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::RequirementId;
use crate::core::identifiers::SessionId;
use crate::core::project::Project;
use crate::core::status::ControlStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Storage interface errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages avoid embedding raw row payloads.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Storage engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Invalid stored data.
    #[error("store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// One stored assessment row for `(project, framework, requirement)`.
///
/// # Invariants
/// - Re-assessments overwrite the row in place; history lives in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRow {
    /// Owning project identifier.
    pub project_id: ProjectId,
    /// Catalog requirement identifier.
    pub requirement_id: RequirementId,
    /// Canonical assessment status.
    pub status: ControlStatus,
    /// Description of the supporting evidence.
    pub evidence_description: String,
    /// Path to the evidence artifact when one exists.
    pub evidence_path: String,
    /// Assessor notes.
    pub notes: String,
    /// Raw automated-check result label when the row was auto-assessed.
    pub automation_result: String,
    /// Acting assessor identity.
    pub assessor: String,
    /// Timestamp of the last upsert.
    pub updated_at: Timestamp,
}

/// One recorded SBOM generation.
///
/// # Invariants
/// - `version` labels are monotonically increasing per project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomRecord {
    /// Owning project identifier.
    pub project_id: ProjectId,
    /// SBOM version label (e.g. `2.0`).
    pub version: String,
    /// SBOM document format (`cyclonedx`).
    pub format: String,
    /// Output file path.
    pub file_path: String,
    /// Number of unique components in the document.
    pub component_count: u64,
    /// Known vulnerability count (zero until scanning runs).
    pub vulnerability_count: u64,
    /// Generation timestamp.
    pub created_at: Timestamp,
}

/// One requirements-intake session.
///
/// # Invariants
/// - Sessions exclusively own their intake requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeSession {
    /// Session identifier.
    pub id: SessionId,
    /// Associated project when known.
    pub project_id: Option<ProjectId>,
}

/// One free-text requirement captured during intake.
///
/// # Invariants
/// - `clarity_score` and `completeness_score` are in `[0, 1]` when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRequirement {
    /// Row identifier within the session.
    pub id: String,
    /// Owning session identifier.
    pub session_id: SessionId,
    /// Raw requirement text.
    pub raw_text: String,
    /// Declared requirement type (e.g. `security`, `performance`).
    pub requirement_type: String,
    /// Stored clarity score when prior analysis ran.
    pub clarity_score: Option<f64>,
    /// Stored completeness score when prior analysis ran.
    pub completeness_score: Option<f64>,
}

// ============================================================================
// SECTION: Compliance Store
// ============================================================================

/// Backend-agnostic compliance store.
///
/// The store serializes concurrent writers itself; callers issue short
/// transactions through these methods and never hold cross-call state.
pub trait ComplianceStore {
    /// Loads a project by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the project does not exist and
    /// other variants on storage failures.
    fn load_project(&self, project_id: &ProjectId) -> Result<Project, StoreError>;

    /// Creates or updates a project record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn upsert_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Loads all assessment rows for `(project, framework)` ordered by
    /// requirement id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn load_assessments(
        &self,
        framework: FrameworkId,
        project_id: &ProjectId,
    ) -> Result<Vec<AssessmentRow>, StoreError>;

    /// Upserts assessment rows and appends the audit event in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures; on error neither the rows
    /// nor the event are persisted.
    fn upsert_assessments(
        &self,
        framework: FrameworkId,
        rows: &[AssessmentRow],
        event: &AuditEvent,
    ) -> Result<(), StoreError>;

    /// Appends one audit event outside an assessment transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures. Callers treat this as
    /// best-effort: a failed append is reported on stderr and must not fail
    /// the containing operation.
    fn append_audit(&self, event: &AuditEvent) -> Result<(), StoreError>;

    /// Counts audit events of one type for a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn count_audit_events(
        &self,
        project_id: &ProjectId,
        event_type: &str,
    ) -> Result<u64, StoreError>;

    /// Replaces the stored findings for a project and appends the audit
    /// event in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn replace_findings(
        &self,
        project_id: &ProjectId,
        findings: &[Finding],
        event: &AuditEvent,
    ) -> Result<(), StoreError>;

    /// Loads all findings for a project ordered by finding id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn load_findings(&self, project_id: &ProjectId) -> Result<Vec<Finding>, StoreError>;

    /// Records one generated SBOM.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn record_sbom(&self, record: &SbomRecord) -> Result<(), StoreError>;

    /// Counts recorded SBOMs for a project (used for version labels).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn count_sbom_records(&self, project_id: &ProjectId) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Intake Store
// ============================================================================

/// Backend-agnostic requirements-intake store.
pub trait IntakeStore {
    /// Loads an intake session by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the session does not exist and
    /// other variants on storage failures.
    fn load_session(&self, session_id: &SessionId) -> Result<IntakeSession, StoreError>;

    /// Loads all requirements captured in a session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on storage failures.
    fn load_requirements(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<IntakeRequirement>, StoreError>;
}
