// crates/muster-store-sqlite/src/lib.rs
// ============================================================================
// Module: Muster SQLite Store
// Description: Durable compliance store backed by SQLite WAL.
// Purpose: Persist projects, assessments, findings, audit trail, and intake.
// Dependencies: muster-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate implements the [`muster_core::ComplianceStore`] and
//! [`muster_core::IntakeStore`] interfaces on SQLite. Every assessment write
//! pairs the row mutations with their audit event inside one transaction;
//! the audit trail itself is append-only. Database contents are untrusted:
//! stored labels are re-parsed through the canonical enums and fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use store::SqliteComplianceStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::assessment_table;
