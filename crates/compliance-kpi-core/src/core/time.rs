// crates/compliance-kpi-core/src/core/time.rs
// ============================================================================
// Module: Compliance KPI Time Model
// Description: Run timestamps and their ledger text forms.
// Purpose: Give every snapshot a sortable, second-precision UTC run time.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! The orchestrator never reads wall-clock time on its own; hosts pass a
//! [`RunTimestamp`] in, usually from [`RunTimestamp::now`]. Two text forms
//! exist: the ledger column form `YYYY-MM-DD_HH-MM-SS` and the compact form
//! `YYYYMMDD_HHMMSS` embedded in fallback file names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Text did not match the ledger timestamp form.
    #[error("invalid run timestamp {value:?}: {reason}")]
    Parse {
        /// Offending text.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// Value is outside the representable range.
    #[error("run timestamp out of range: {0}")]
    Range(String),
    /// Formatting failed.
    #[error("run timestamp formatting failed: {0}")]
    Format(String),
}

// ============================================================================
// SECTION: Run Timestamp
// ============================================================================

/// UTC run time with second precision.
///
/// # Invariants
/// - Sub-second components are always zero, so the ledger text form
///   round-trips exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunTimestamp(OffsetDateTime);

impl RunTimestamp {
    /// Returns the current UTC time truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self(now.replace_nanosecond(0).unwrap_or(now))
    }

    /// Builds a timestamp from unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Range`] when the value is not representable.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimestampError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|err| TimestampError::Range(err.to_string()))
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Parses the ledger column form `YYYY-MM-DD_HH-MM-SS`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the text does not match.
    pub fn parse_ledger(value: &str) -> Result<Self, TimestampError> {
        let parsed = PrimitiveDateTime::parse(
            value.trim(),
            format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]"),
        )
        .map_err(|err| TimestampError::Parse {
            value: value.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self(parsed.assume_utc()))
    }

    /// Formats the ledger column form `YYYY-MM-DD_HH-MM-SS`.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Format`] when formatting fails.
    pub fn ledger_text(&self) -> Result<String, TimestampError> {
        self.0
            .format(format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]"))
            .map_err(|err| TimestampError::Format(err.to_string()))
    }

    /// Formats the compact form `YYYYMMDD_HHMMSS` used in fallback file names.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Format`] when formatting fails.
    pub fn compact_text(&self) -> Result<String, TimestampError> {
        self.0
            .format(format_description!("[year][month][day]_[hour][minute][second]"))
            .map_err(|err| TimestampError::Format(err.to_string()))
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.ledger_text().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl TryFrom<String> for RunTimestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_ledger(&value)
    }
}

impl From<RunTimestamp> for String {
    fn from(value: RunTimestamp) -> Self {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::RunTimestamp;

    #[test]
    fn ledger_text_round_trips() {
        let ts = RunTimestamp::from_unix_seconds(1_760_000_000).expect("timestamp");
        let text = ts.ledger_text().expect("format");
        assert_eq!(text, "2025-10-09_08-53-20");
        assert_eq!(RunTimestamp::parse_ledger(&text).expect("parse"), ts);
    }

    #[test]
    fn compact_text_matches_fallback_pattern() {
        let ts = RunTimestamp::from_unix_seconds(1_760_000_000).expect("timestamp");
        assert_eq!(ts.compact_text().expect("format"), "20251009_085320");
    }

    #[test]
    fn now_has_no_subsecond_component() {
        let ts = RunTimestamp::now();
        let reparsed = RunTimestamp::parse_ledger(&ts.to_string()).expect("parse");
        assert_eq!(reparsed, ts);
    }

    #[test]
    fn rejects_foreign_formats() {
        assert!(RunTimestamp::parse_ledger("2025-10-09T08:53:20Z").is_err());
        assert!(RunTimestamp::parse_ledger("").is_err());
    }
}
