// crates/compliance-kpi-core/src/core/identifiers.rs
// ============================================================================
// Module: Compliance KPI Identifiers
// Description: Validated control-set names used as ledger column prefixes.
// Purpose: Keep ledger headers parseable by construction.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A control-set name becomes part of the ledger header
//! (`{name}_total`, `{name}_readiness`), so it is validated once at the
//! boundary instead of being escaped on every write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a control-set name in bytes.
pub const MAX_CONTROL_SET_NAME_BYTES: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a control-set name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlSetNameError {
    /// Name is empty.
    #[error("control set name must not be empty")]
    Empty,
    /// Name exceeds [`MAX_CONTROL_SET_NAME_BYTES`].
    #[error("control set name exceeds {MAX_CONTROL_SET_NAME_BYTES} bytes")]
    TooLong,
    /// Name has leading or trailing whitespace.
    #[error("control set name must not start or end with whitespace")]
    Padded,
    /// Name contains a character that would break the ledger header.
    #[error("control set name contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Name of a tracked control set (for example `27001`).
///
/// # Invariants
/// - Non-empty, at most [`MAX_CONTROL_SET_NAME_BYTES`] bytes.
/// - No comma, double quote, CR, LF, or other control characters.
/// - No leading or trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlSetName(String);

impl ControlSetName {
    /// Creates a validated control-set name.
    ///
    /// # Errors
    ///
    /// Returns [`ControlSetNameError`] when the name would not survive a
    /// round trip through the ledger header.
    pub fn new(name: impl Into<String>) -> Result<Self, ControlSetNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ControlSetNameError::Empty);
        }
        if name.len() > MAX_CONTROL_SET_NAME_BYTES {
            return Err(ControlSetNameError::TooLong);
        }
        if name.trim() != name {
            return Err(ControlSetNameError::Padded);
        }
        if let Some(bad) = name.chars().find(|ch| matches!(ch, ',' | '"') || ch.is_control()) {
            return Err(ControlSetNameError::ForbiddenChar(bad));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ledger column holding the valid-score count.
    #[must_use]
    pub fn total_column(&self) -> String {
        format!("{}_total", self.0)
    }

    /// Ledger column holding the mean readiness.
    #[must_use]
    pub fn readiness_column(&self) -> String {
        format!("{}_readiness", self.0)
    }
}

impl fmt::Display for ControlSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for ControlSetName {
    type Error = ControlSetNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ControlSetName {
    type Error = ControlSetNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ControlSetName> for String {
    fn from(value: ControlSetName) -> Self {
        value.0
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

    use super::ControlSetName;
    use super::ControlSetNameError;

    #[test]
    fn accepts_standard_names() {
        let name = ControlSetName::new("27001").expect("valid name");
        assert_eq!(name.total_column(), "27001_total");
        assert_eq!(name.readiness_column(), "27001_readiness");
        assert!(ControlSetName::new("ISO 27701").is_ok());
    }

    #[test]
    fn rejects_header_breaking_names() {
        assert_eq!(ControlSetName::new(""), Err(ControlSetNameError::Empty));
        assert_eq!(ControlSetName::new(" a"), Err(ControlSetNameError::Padded));
        assert_eq!(ControlSetName::new("a,b"), Err(ControlSetNameError::ForbiddenChar(',')));
        assert_eq!(ControlSetName::new("a\"b"), Err(ControlSetNameError::ForbiddenChar('"')));
        assert_eq!(ControlSetName::new("a\nb"), Err(ControlSetNameError::ForbiddenChar('\n')));
        assert_eq!(ControlSetName::new("x".repeat(65)), Err(ControlSetNameError::TooLong));
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<ControlSetName, _> = serde_json::from_str("\"27701\"");
        assert!(ok.is_ok());
        let bad: Result<ControlSetName, _> = serde_json::from_str("\"a,b\"");
        assert!(bad.is_err());
    }
}
