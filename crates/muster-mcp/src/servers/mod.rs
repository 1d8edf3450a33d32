// crates/muster-mcp/src/servers/mod.rs
// ============================================================================
// Module: Concrete MCP Servers
// Description: Server construction wiring tools to platform subsystems.
// Purpose: Build the compliance and requirements servers from configuration.
// Dependencies: muster-config, muster-core, muster-store-sqlite
// ============================================================================

//! ## Overview
//! Each concrete server opens the shared store, loads the CUI marking
//! config, and registers its tools, resources, and prompts explicitly. The
//! wall clock is read exactly once per tool invocation at this edge; the
//! subsystems below never read it.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Compliance server (assess, report, STIG, SBOM, RTM, CUI tools).
pub mod compliance;
/// Requirements server (clarification tools and intake resources).
pub mod requirements;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use muster_core::Timestamp;
use muster_store_sqlite::SqliteStoreError;
use thiserror::Error;

use crate::registry::RegistryError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server construction errors.
///
/// # Invariants
/// - Construction fails closed; a partially wired server never serves.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Registration failed (duplicate name or invalid schema/template).
    #[error("registration error: {0}")]
    Registry(#[from] RegistryError),
    /// Store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] SqliteStoreError),
}

// ============================================================================
// SECTION: Clock Edge
// ============================================================================

/// Reads the wall clock once for a tool invocation.
///
/// The epoch fallback only triggers on clocks set before 1970.
#[must_use]
pub fn current_timestamp() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    Timestamp::from_unix_millis(millis)
}
