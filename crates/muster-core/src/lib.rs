// crates/muster-core/src/lib.rs
// ============================================================================
// Module: Muster Core
// Description: Canonical domain model for the Muster compliance platform.
// Purpose: Provide identifiers, status model, catalogs, scoring, and gates.
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! `muster-core` defines the shared domain model used by the Muster MCP
//! servers, framework assessors, and report generators. The crate is
//! deliberately backend-free: storage and transport live behind the traits in
//! [`interfaces`], and the core never reads wall-clock time directly. All
//! scoring and gate evaluation is deterministic over stored assessment rows.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clarify;
pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use self::core::audit::AuditEvent;
pub use self::core::catalog::Catalog;
pub use self::core::catalog::CatalogError;
pub use self::core::catalog::CatalogRequirement;
pub use self::core::finding::Finding;
pub use self::core::gates;
pub use self::core::gates::GateResult;
pub use self::core::hashing;
pub use self::core::identifiers::FindingId;
pub use self::core::identifiers::FrameworkId;
pub use self::core::identifiers::ProjectId;
pub use self::core::identifiers::RequirementId;
pub use self::core::identifiers::SessionId;
pub use self::core::project::ImpactLevel;
pub use self::core::project::Project;
pub use self::core::scoring;
pub use self::core::status::AutomationLevel;
pub use self::core::status::ControlStatus;
pub use self::core::status::FindingStatus;
pub use self::core::status::Priority;
pub use self::core::status::StatusStyle;
pub use self::core::status::StigSeverity;
pub use self::core::time::Timestamp;
pub use self::interfaces::AssessmentRow;
pub use self::interfaces::ComplianceStore;
pub use self::interfaces::IntakeRequirement;
pub use self::interfaces::IntakeSession;
pub use self::interfaces::IntakeStore;
pub use self::interfaces::SbomRecord;
pub use self::interfaces::StoreError;
