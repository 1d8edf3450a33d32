// crates/muster-core/src/core/audit.rs
// ============================================================================
// Module: Audit Trail Events
// Description: Append-only audit event records for state-changing operations.
// Purpose: Pair every assessor and report write with a durable audit record.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every state-changing core operation writes exactly one audit event. The
//! audit trail is append-only: events are never updated or deleted. Report
//! versioning counts prior events of the same `event_type` for the project,
//! so event types must stay stable across releases.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ProjectId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Audit Event
// ============================================================================

/// One append-only audit trail event.
///
/// # Invariants
/// - Events are immutable once written.
/// - `event_type` values are stable; report versions are derived from their counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Owning project identifier.
    pub project_id: ProjectId,
    /// Stable event type label (e.g. `cmmc_assessed`, `sbom_generated`).
    pub event_type: String,
    /// Acting component or operator identity.
    pub actor: String,
    /// Free-text action description.
    pub action: String,
    /// Structured event details.
    pub details: Value,
    /// Paths of files affected by the operation.
    pub affected_files: Vec<String>,
    /// Classification label of the event record.
    pub classification: String,
    /// Event timestamp supplied by the caller.
    pub timestamp: Timestamp,
}

impl AuditEvent {
    /// Builds an audit event with the platform actor and CUI classification.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        event_type: impl Into<String>,
        action: impl Into<String>,
        details: Value,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            project_id,
            event_type: event_type.into(),
            actor: "muster-compliance-engine".to_string(),
            action: action.into(),
            details,
            affected_files: Vec::new(),
            classification: "CUI".to_string(),
            timestamp,
        }
    }

    /// Adds an affected file path to the event.
    #[must_use]
    pub fn with_affected_file(mut self, path: impl Into<String>) -> Self {
        self.affected_files.push(path.into());
        self
    }

    /// Overrides the acting identity.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}
