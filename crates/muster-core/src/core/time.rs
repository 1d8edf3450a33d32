// crates/muster-core/src/core/time.rs
// ============================================================================
// Module: Muster Time Model
// Description: Explicit timestamp values for audit events and reports.
// Purpose: Keep core computations deterministic; hosts supply all clock values.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Muster embeds explicit time values in audit events, assessment rows, and
//! report headers. The core never reads wall-clock time directly; the CLI and
//! server edges construct a [`Timestamp`] once per operation and thread it
//! through. This keeps report generation reproducible in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds per day, used for remediation target date arithmetic.
const MILLIS_PER_DAY: i64 = 86_400_000;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp used across Muster records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Stored as unix epoch milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns a timestamp shifted forward by whole days.
    #[must_use]
    pub const fn plus_days(self, days: i64) -> Self {
        Self(self.0.saturating_add(days.saturating_mul(MILLIS_PER_DAY)))
    }

    /// Renders the timestamp as `YYYY-MM-DD HH:MM UTC` for report headers.
    #[must_use]
    pub fn as_utc_display(self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
        self.to_datetime()
            .and_then(|datetime| datetime.format(&format).ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Renders the timestamp as `YYYY-MM-DD` for target dates.
    #[must_use]
    pub fn as_utc_date(self) -> String {
        let format = format_description!("[year]-[month]-[day]");
        self.to_datetime()
            .and_then(|datetime| datetime.format(&format).ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Renders the timestamp as RFC 3339 seconds (`YYYY-MM-DDTHH:MM:SSZ`).
    #[must_use]
    pub fn as_rfc3339_seconds(self) -> String {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
        self.to_datetime()
            .and_then(|datetime| datetime.format(&format).ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Converts the millisecond value into an [`OffsetDateTime`] when in range.
    fn to_datetime(self) -> Option<OffsetDateTime> {
        let seconds = self.0.div_euclid(1_000);
        OffsetDateTime::from_unix_timestamp(seconds).ok()
    }
}
