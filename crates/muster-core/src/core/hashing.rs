// crates/muster-core/src/core/hashing.rs
// ============================================================================
// Module: Muster Hashing
// Description: Canonical JSON serialization and short SHA-256 digests.
// Purpose: Provide stable hashes for span attributes and SBOM references.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Hashes in Muster are computed over canonical JSON bytes (RFC 8785 JCS) so
//! that semantically equal values always hash identically regardless of map
//! ordering. Short digests are the first 16 hex characters of the SHA-256
//! digest and are used for trace span attributes and CycloneDX `bom-ref`
//! values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of a short digest in hex characters.
pub const SHORT_DIGEST_HEX_LEN: usize = 16;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hashing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical JSON serialization failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Functions
// ============================================================================

/// Serializes a value into canonical JSON bytes (JCS).
///
/// # Errors
///
/// Returns [`HashError`] when the value cannot be serialized.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Computes the full SHA-256 digest of the bytes as lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Computes the 16-hex-character short digest of the bytes.
#[must_use]
pub fn short_digest(bytes: &[u8]) -> String {
    let mut hex = sha256_hex(bytes);
    hex.truncate(SHORT_DIGEST_HEX_LEN);
    hex
}

/// Computes the short digest of a value's canonical JSON form.
///
/// # Errors
///
/// Returns [`HashError`] when the value cannot be serialized.
pub fn short_canonical_digest<T: Serialize>(value: &T) -> Result<String, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(short_digest(&bytes))
}
