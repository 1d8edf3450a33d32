// crates/muster-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Compliance Store
// Description: ComplianceStore and IntakeStore implementations on SQLite WAL.
// Purpose: Persist assessment state with audit events in the same transaction.
// Dependencies: muster-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements the durable store shared by all Muster MCP
//! servers. Each framework keeps its own `*_assessments` table; the audit
//! trail is a single append-only table whose per-event-type counts drive
//! report versioning. Loads re-parse stored status labels through the
//! canonical enums and fail closed on unknown values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use muster_core::AssessmentRow;
use muster_core::AuditEvent;
use muster_core::ComplianceStore;
use muster_core::ControlStatus;
use muster_core::Finding;
use muster_core::FindingId;
use muster_core::FindingStatus;
use muster_core::FrameworkId;
use muster_core::ImpactLevel;
use muster_core::IntakeRequirement;
use muster_core::IntakeSession;
use muster_core::IntakeStore;
use muster_core::Project;
use muster_core::ProjectId;
use muster_core::RequirementId;
use muster_core::SbomRecord;
use muster_core::SessionId;
use muster_core::StigSeverity;
use muster_core::StoreError;
use muster_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Returns the assessment table name for a framework.
#[must_use]
pub const fn assessment_table(framework: FrameworkId) -> &'static str {
    match framework {
        FrameworkId::Nist80053 => "nist_800_53_assessments",
        FrameworkId::Fips => "fips_assessments",
        FrameworkId::Cmmc => "cmmc_assessments",
        FrameworkId::Fedramp => "fedramp_assessments",
        FrameworkId::Atlas => "atlas_assessments",
        FrameworkId::Sbd => "sbd_assessments",
        FrameworkId::Ivv => "ivv_assessments",
        FrameworkId::Cssp => "cssp_assessments",
        FrameworkId::Zta => "zta_assessments",
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` compliance store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config with defaults for the given database path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw row payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Requested record does not exist.
    #[error("sqlite store not found: {0}")]
    NotFound(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Db(message)
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
        }
    }
}

/// Maps a `rusqlite` error into a store error.
fn db_err(error: &rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed compliance store with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - Assessment upserts and their audit event commit in one transaction.
#[derive(Clone)]
pub struct SqliteComplianceStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteComplianceStore {
    /// Opens an `SQLite`-backed compliance store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Locks the shared connection, mapping poisoning to a store error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Verifies the store can execute a simple SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] if the mutex is poisoned or the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute("SELECT 1", []).map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Creates or replaces an intake session record.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failures.
    pub fn upsert_intake_session(&self, session: &IntakeSession) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO intake_sessions (id, project_id) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET project_id = excluded.project_id",
                params![
                    session.id.as_str(),
                    session.project_id.as_ref().map(ProjectId::as_str)
                ],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Creates or replaces one intake requirement row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] on database failures.
    pub fn upsert_intake_requirement(
        &self,
        requirement: &IntakeRequirement,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO intake_requirements
                 (id, session_id, raw_text, requirement_type, clarity_score, completeness_score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(session_id, id) DO UPDATE SET
                     raw_text = excluded.raw_text,
                     requirement_type = excluded.requirement_type,
                     clarity_score = excluded.clarity_score,
                     completeness_score = excluded.completeness_score",
                params![
                    requirement.id,
                    requirement.session_id.as_str(),
                    requirement.raw_text,
                    requirement.requirement_type,
                    requirement.clarity_score,
                    requirement.completeness_score,
                ],
            )
            .map_err(|err| db_err(&err))?;
        Ok(())
    }

    /// Appends one audit event on an open transaction.
    fn insert_audit_event(
        tx: &rusqlite::Transaction<'_>,
        event: &AuditEvent,
    ) -> Result<(), SqliteStoreError> {
        let details = serde_json::to_string(&event.details)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let affected_files = serde_json::to_string(&event.affected_files)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        tx.execute(
            "INSERT INTO audit_trail
             (project_id, event_type, actor, action, details, affected_files,
              classification, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.project_id.as_str(),
                event.event_type,
                event.actor,
                event.action,
                details,
                affected_files,
                event.classification,
                event.timestamp.as_unix_millis(),
            ],
        )
        .map_err(|err| db_err(&err))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: ComplianceStore Implementation
// ============================================================================

impl ComplianceStore for SqliteComplianceStore {
    fn load_project(&self, project_id: &ProjectId) -> Result<Project, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let row = guard
            .query_row(
                "SELECT id, name, directory_path, classification, impact_level
                 FROM projects WHERE id = ?1",
                params![project_id.as_str()],
                |row| {
                    let id: String = row.get(0)?;
                    let name: String = row.get(1)?;
                    let directory_path: Option<String> = row.get(2)?;
                    let classification: String = row.get(3)?;
                    let impact_level: String = row.get(4)?;
                    Ok((id, name, directory_path, classification, impact_level))
                },
            )
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let Some((id, name, directory_path, classification, impact_level)) = row else {
            return Err(StoreError::NotFound(format!(
                "project '{}' not found",
                project_id.as_str()
            )));
        };
        let impact_level = ImpactLevel::parse_label(&impact_level).ok_or_else(|| {
            StoreError::Invalid(format!("unknown impact level '{impact_level}' for project {id}"))
        })?;
        Ok(Project {
            id: ProjectId::new(id),
            name,
            directory_path: directory_path.map(PathBuf::from),
            classification,
            impact_level,
        })
    }

    fn upsert_project(&self, project: &Project) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT INTO projects (id, name, directory_path, classification, impact_level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     directory_path = excluded.directory_path,
                     classification = excluded.classification,
                     impact_level = excluded.impact_level",
                params![
                    project.id.as_str(),
                    project.name,
                    project.directory_path.as_ref().map(|path| path.display().to_string()),
                    project.classification,
                    project.impact_level.as_str(),
                ],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn load_assessments(
        &self,
        framework: FrameworkId,
        project_id: &ProjectId,
    ) -> Result<Vec<AssessmentRow>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let table = assessment_table(framework);
        let mut stmt = guard
            .prepare(&format!(
                "SELECT project_id, requirement_id, status, evidence_description,
                        evidence_path, notes, automation_result, assessor, updated_at
                 FROM {table} WHERE project_id = ?1 ORDER BY requirement_id"
            ))
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![project_id.as_str()], |row| {
                let project: String = row.get(0)?;
                let requirement: String = row.get(1)?;
                let status: String = row.get(2)?;
                let evidence_description: String = row.get(3)?;
                let evidence_path: String = row.get(4)?;
                let notes: String = row.get(5)?;
                let automation_result: String = row.get(6)?;
                let assessor: String = row.get(7)?;
                let updated_at: i64 = row.get(8)?;
                Ok((
                    project,
                    requirement,
                    status,
                    evidence_description,
                    evidence_path,
                    notes,
                    automation_result,
                    assessor,
                    updated_at,
                ))
            })
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            let (
                project,
                requirement,
                status,
                evidence_description,
                evidence_path,
                notes,
                automation_result,
                assessor,
                updated_at,
            ) = row.map_err(|err| StoreError::Db(err.to_string()))?;
            let status = ControlStatus::parse_label(&status).ok_or_else(|| {
                StoreError::Invalid(format!("unknown status '{status}' for {requirement}"))
            })?;
            results.push(AssessmentRow {
                project_id: ProjectId::new(project),
                requirement_id: RequirementId::new(requirement),
                status,
                evidence_description,
                evidence_path,
                notes,
                automation_result,
                assessor,
                updated_at: Timestamp::from_unix_millis(updated_at),
            });
        }
        Ok(results)
    }

    fn upsert_assessments(
        &self,
        framework: FrameworkId,
        rows: &[AssessmentRow],
        event: &AuditEvent,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
        let table = assessment_table(framework);
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table}
                     (project_id, requirement_id, status, evidence_description,
                      evidence_path, notes, automation_result, assessor, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(project_id, requirement_id) DO UPDATE SET
                         status = excluded.status,
                         evidence_description = excluded.evidence_description,
                         evidence_path = excluded.evidence_path,
                         notes = excluded.notes,
                         automation_result = excluded.automation_result,
                         assessor = excluded.assessor,
                         updated_at = excluded.updated_at"
                ))
                .map_err(|err| StoreError::Db(err.to_string()))?;
            for row in rows {
                stmt.execute(params![
                    row.project_id.as_str(),
                    row.requirement_id.as_str(),
                    row.status.as_str(),
                    row.evidence_description,
                    row.evidence_path,
                    row.notes,
                    row.automation_result,
                    row.assessor,
                    row.updated_at.as_unix_millis(),
                ])
                .map_err(|err| StoreError::Db(err.to_string()))?;
            }
        }
        Self::insert_audit_event(&tx, event).map_err(StoreError::from)?;
        tx.commit().map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn append_audit(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
        Self::insert_audit_event(&tx, event).map_err(StoreError::from)?;
        tx.commit().map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn count_audit_events(
        &self,
        project_id: &ProjectId,
        event_type: &str,
    ) -> Result<u64, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM audit_trail WHERE project_id = ?1 AND event_type = ?2",
                params![project_id.as_str(), event_type],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        u64::try_from(count)
            .map_err(|_| StoreError::Invalid("negative audit event count".to_string()))
    }

    fn replace_findings(
        &self,
        project_id: &ProjectId,
        findings: &[Finding],
        event: &AuditEvent,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
        tx.execute(
            "DELETE FROM stig_findings WHERE project_id = ?1",
            params![project_id.as_str()],
        )
        .map_err(|err| StoreError::Db(err.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO stig_findings
                     (project_id, finding_id, rule_id, severity, title, status,
                      evidence, fix_text, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(|err| StoreError::Db(err.to_string()))?;
            for finding in findings {
                stmt.execute(params![
                    finding.project_id.as_str(),
                    finding.finding_id.as_str(),
                    finding.rule_id,
                    finding.severity.as_str(),
                    finding.title,
                    finding.status.as_str(),
                    finding.evidence,
                    finding.fix_text,
                    finding.updated_at.as_unix_millis(),
                ])
                .map_err(|err| StoreError::Db(err.to_string()))?;
            }
        }
        Self::insert_audit_event(&tx, event).map_err(StoreError::from)?;
        tx.commit().map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn load_findings(&self, project_id: &ProjectId) -> Result<Vec<Finding>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let mut stmt = guard
            .prepare(
                "SELECT project_id, finding_id, rule_id, severity, title, status,
                        evidence, fix_text, updated_at
                 FROM stig_findings WHERE project_id = ?1 ORDER BY finding_id",
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![project_id.as_str()], |row| {
                let project: String = row.get(0)?;
                let finding: String = row.get(1)?;
                let rule_id: String = row.get(2)?;
                let severity: String = row.get(3)?;
                let title: String = row.get(4)?;
                let status: String = row.get(5)?;
                let evidence: String = row.get(6)?;
                let fix_text: String = row.get(7)?;
                let updated_at: i64 = row.get(8)?;
                Ok((
                    project, finding, rule_id, severity, title, status, evidence, fix_text,
                    updated_at,
                ))
            })
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            let (project, finding, rule_id, severity, title, status, evidence, fix_text, updated_at) =
                row.map_err(|err| StoreError::Db(err.to_string()))?;
            let severity = StigSeverity::parse_label(&severity).ok_or_else(|| {
                StoreError::Invalid(format!("unknown severity '{severity}' for {finding}"))
            })?;
            let status = FindingStatus::parse_label(&status).ok_or_else(|| {
                StoreError::Invalid(format!("unknown finding status '{status}' for {finding}"))
            })?;
            results.push(Finding {
                project_id: ProjectId::new(project),
                finding_id: FindingId::new(finding),
                rule_id,
                severity,
                title,
                status,
                evidence,
                fix_text,
                updated_at: Timestamp::from_unix_millis(updated_at),
            });
        }
        Ok(results)
    }

    fn record_sbom(&self, record: &SbomRecord) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .execute(
                "INSERT INTO sbom_records
                 (project_id, version, format, file_path, component_count,
                  vulnerability_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.project_id.as_str(),
                    record.version,
                    record.format,
                    record.file_path,
                    i64::try_from(record.component_count)
                        .map_err(|_| StoreError::Invalid("component count too large".to_string()))?,
                    i64::try_from(record.vulnerability_count)
                        .map_err(|_| StoreError::Invalid("vulnerability count too large".to_string()))?,
                    record.created_at.as_unix_millis(),
                ],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn count_sbom_records(&self, project_id: &ProjectId) -> Result<u64, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let count: i64 = guard
            .query_row(
                "SELECT COUNT(*) FROM sbom_records WHERE project_id = ?1",
                params![project_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        u64::try_from(count)
            .map_err(|_| StoreError::Invalid("negative sbom record count".to_string()))
    }
}

// ============================================================================
// SECTION: IntakeStore Implementation
// ============================================================================

impl IntakeStore for SqliteComplianceStore {
    fn load_session(&self, session_id: &SessionId) -> Result<IntakeSession, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let row = guard
            .query_row(
                "SELECT id, project_id FROM intake_sessions WHERE id = ?1",
                params![session_id.as_str()],
                |row| {
                    let id: String = row.get(0)?;
                    let project_id: Option<String> = row.get(1)?;
                    Ok((id, project_id))
                },
            )
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let Some((id, project_id)) = row else {
            return Err(StoreError::NotFound(format!(
                "session '{}' not found",
                session_id.as_str()
            )));
        };
        Ok(IntakeSession {
            id: SessionId::new(id),
            project_id: project_id.map(ProjectId::new),
        })
    }

    fn load_requirements(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<IntakeRequirement>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let mut stmt = guard
            .prepare(
                "SELECT id, session_id, raw_text, requirement_type, clarity_score,
                        completeness_score
                 FROM intake_requirements WHERE session_id = ?1 ORDER BY id",
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![session_id.as_str()], |row| {
                let id: String = row.get(0)?;
                let session: String = row.get(1)?;
                let raw_text: String = row.get(2)?;
                let requirement_type: String = row.get(3)?;
                let clarity_score: Option<f64> = row.get(4)?;
                let completeness_score: Option<f64> = row.get(5)?;
                Ok((id, session, raw_text, requirement_type, clarity_score, completeness_score))
            })
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let mut results = Vec::new();
        for row in rows {
            let (id, session, raw_text, requirement_type, clarity_score, completeness_score) =
                row.map_err(|err| StoreError::Db(err.to_string()))?;
            results.push(IntakeRequirement {
                id,
                session_id: SessionId::new(session),
                raw_text,
                requirement_type,
                clarity_score,
                completeness_score,
            });
        }
        Ok(results)
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Rejects store paths that point at directories.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(format!(
            "store path is a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Creates the parent directory of the store file when missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Opens a connection with the configured pragmas applied.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let connection =
        Connection::open(&config.path).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_err(&err))?;
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_err(&err))?;
    Ok(connection)
}

/// Creates tables and enforces the schema version.
fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_err(&err))?;
    let version: Option<i64> = connection
        .query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| db_err(&err))?;
    match version {
        None => {
            connection
                .execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_err(&err))?;
        }
        Some(found) if found == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected schema version {SCHEMA_VERSION}, found {found}"
            )));
        }
    }

    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS projects (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 directory_path TEXT,
                 classification TEXT NOT NULL,
                 impact_level TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS audit_trail (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 project_id TEXT NOT NULL,
                 event_type TEXT NOT NULL,
                 actor TEXT NOT NULL,
                 action TEXT NOT NULL,
                 details TEXT NOT NULL,
                 affected_files TEXT NOT NULL,
                 classification TEXT NOT NULL,
                 created_at INTEGER NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_audit_trail_project_type
                 ON audit_trail (project_id, event_type);
             CREATE TABLE IF NOT EXISTS stig_findings (
                 project_id TEXT NOT NULL,
                 finding_id TEXT NOT NULL,
                 rule_id TEXT NOT NULL,
                 severity TEXT NOT NULL,
                 title TEXT NOT NULL,
                 status TEXT NOT NULL,
                 evidence TEXT NOT NULL,
                 fix_text TEXT NOT NULL,
                 updated_at INTEGER NOT NULL,
                 PRIMARY KEY (project_id, finding_id)
             );
             CREATE TABLE IF NOT EXISTS sbom_records (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 project_id TEXT NOT NULL,
                 version TEXT NOT NULL,
                 format TEXT NOT NULL,
                 file_path TEXT NOT NULL,
                 component_count INTEGER NOT NULL,
                 vulnerability_count INTEGER NOT NULL,
                 created_at INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS intake_sessions (
                 id TEXT PRIMARY KEY,
                 project_id TEXT
             );
             CREATE TABLE IF NOT EXISTS intake_requirements (
                 id TEXT NOT NULL,
                 session_id TEXT NOT NULL,
                 raw_text TEXT NOT NULL,
                 requirement_type TEXT NOT NULL,
                 clarity_score REAL,
                 completeness_score REAL,
                 PRIMARY KEY (session_id, id)
             );",
        )
        .map_err(|err| db_err(&err))?;

    for framework in FrameworkId::ALL {
        let table = assessment_table(framework);
        connection
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                     project_id TEXT NOT NULL,
                     requirement_id TEXT NOT NULL,
                     status TEXT NOT NULL,
                     evidence_description TEXT NOT NULL,
                     evidence_path TEXT NOT NULL,
                     notes TEXT NOT NULL,
                     automation_result TEXT NOT NULL,
                     assessor TEXT NOT NULL,
                     updated_at INTEGER NOT NULL,
                     PRIMARY KEY (project_id, requirement_id)
                 );"
            ))
            .map_err(|err| db_err(&err))?;
    }
    Ok(())
}
