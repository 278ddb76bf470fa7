// tracehub-core/src/core/time.rs
// ============================================================================
// Module: TraceHub Time Model
// Description: Canonical timestamp representation for records and events.
// Purpose: Provide deterministic, replayable time values across TraceHub records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! TraceHub records carry explicit timestamps supplied by callers so that
//! rule evaluation, state derivation, and audit-pack assembly stay
//! deterministic. The core never reads wall-clock time; hosts supply "now"
//! through the [`crate::interfaces::Clock`] seam.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp used in TraceHub records (unix epoch milliseconds).
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - Ordering follows the numeric millisecond value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the absolute distance to another timestamp in milliseconds.
    #[must_use]
    pub const fn abs_diff_millis(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Returns the timestamp advanced by the given number of milliseconds.
    #[must_use]
    pub const fn plus_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Parses an RFC 3339 string into a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimeParseError`] when the input is not valid RFC 3339.
    pub fn parse_rfc3339(input: &str) -> Result<Self, TimeParseError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339)
            .map_err(|err| TimeParseError::Invalid(err.to_string()))?;
        let nanos = parsed.unix_timestamp_nanos();
        let millis = i64::try_from(nanos / 1_000_000)
            .map_err(|_| TimeParseError::Invalid("timestamp out of range".to_string()))?;
        Ok(Self(millis))
    }

    /// Formats the timestamp as an RFC 3339 string in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`TimeParseError`] when the millisecond value is out of the
    /// representable range.
    pub fn format_rfc3339(self) -> Result<String, TimeParseError> {
        let nanos = i128::from(self.0) * 1_000_000;
        let value = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|err| TimeParseError::Invalid(err.to_string()))?;
        value.format(&Rfc3339).map_err(|err| TimeParseError::Invalid(err.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing or formatting timestamps.
#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    /// The input or value is not representable.
    #[error("invalid timestamp: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Durations
// ============================================================================

/// Milliseconds in one second.
pub const MILLIS_PER_SECOND: i64 = 1_000;
/// Milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
