// crates/compliance-kpi-core/src/core/snapshot.rs
// ============================================================================
// Module: Compliance KPI History Snapshots
// Description: One ledger row per run and its comma-separated text form.
// Purpose: Own the ledger schema so writers and readers cannot disagree.
// Dependencies: crate::core::{identifiers, kpi, time}, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`HistorySnapshot`] flattens every control set's [`KpiRecord`] into
//! `{set}_total` and `{set}_readiness` columns behind a `timestamp` column.
//! Header: `timestamp,{set1}_total,{set1}_readiness,...`. Totals are written
//! as integers and readiness with exactly one decimal place. Control-set
//! names are validated on construction, so no field ever needs quoting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ControlSetName;
use crate::core::kpi::KpiRecord;
use crate::core::time::RunTimestamp;
use crate::core::time::TimestampError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the leading ledger column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Suffix of the per-set count column.
const TOTAL_SUFFIX: &str = "_total";
/// Suffix of the per-set readiness column.
const READINESS_SUFFIX: &str = "_readiness";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Ledger text that does not match the snapshot schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotParseError {
    /// Header is malformed.
    #[error("invalid ledger header: {0}")]
    Header(String),
    /// Row has the wrong number of fields.
    #[error("expected {expected} fields, found {found}")]
    FieldCount {
        /// Fields required by the header.
        expected: usize,
        /// Fields present in the row.
        found: usize,
    },
    /// Timestamp column failed to parse.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    /// Numeric column failed to parse.
    #[error("invalid value {value:?} in column {column}")]
    Value {
        /// Column name.
        column: String,
        /// Offending text.
        value: String,
    },
}

/// Snapshot values that cannot be written as ledger text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotFormatError {
    /// Timestamp could not be formatted.
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    /// Readiness is NaN or infinite and would not read back.
    #[error("readiness for {control_set} is not finite")]
    NonFiniteReadiness {
        /// Control set carrying the value.
        control_set: ControlSetName,
    },
}

// ============================================================================
// SECTION: Snapshot Types
// ============================================================================

/// KPI values mirrored into the ledger for one control set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Control-set name.
    pub control_set: ControlSetName,
    /// Mirrors [`KpiRecord::total`].
    pub total: u64,
    /// Mirrors [`KpiRecord::readiness`].
    pub readiness: f64,
}

/// One ledger row: all tracked control sets at one run time.
///
/// # Invariants
/// - `entries` order is the ledger column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Run time.
    pub timestamp: RunTimestamp,
    /// Per-control-set values in column order.
    pub entries: Vec<SnapshotEntry>,
}

impl HistorySnapshot {
    /// Builds a snapshot from KPI records in column order.
    #[must_use]
    pub fn from_kpis<'a>(
        timestamp: RunTimestamp,
        kpis: impl IntoIterator<Item = (&'a ControlSetName, &'a KpiRecord)>,
    ) -> Self {
        let entries = kpis
            .into_iter()
            .map(|(name, kpi)| SnapshotEntry {
                control_set: name.clone(),
                total: kpi.total,
                readiness: kpi.readiness,
            })
            .collect();
        Self {
            timestamp,
            entries,
        }
    }

    /// Returns the control-set names in column order.
    #[must_use]
    pub fn control_sets(&self) -> Vec<ControlSetName> {
        self.entries.iter().map(|entry| entry.control_set.clone()).collect()
    }

    /// Returns the entry for a control set.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|entry| entry.control_set.as_str() == name)
    }

    /// Returns the header line (without line terminator).
    #[must_use]
    pub fn header_line(&self) -> String {
        header_line_for(self.entries.iter().map(|entry| &entry.control_set))
    }

    /// Returns the data row (without line terminator).
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotFormatError`] when the timestamp cannot be formatted
    /// or a readiness value is not finite.
    pub fn to_row(&self) -> Result<String, SnapshotFormatError> {
        let mut row = self.timestamp.ledger_text()?;
        for entry in &self.entries {
            if !entry.readiness.is_finite() {
                return Err(SnapshotFormatError::NonFiniteReadiness {
                    control_set: entry.control_set.clone(),
                });
            }
            row.push(',');
            row.push_str(&entry.total.to_string());
            row.push(',');
            row.push_str(&format!("{:.1}", entry.readiness));
        }
        Ok(row)
    }

    /// Parses a ledger header into control-set names.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotParseError::Header`] when the header does not follow
    /// the `timestamp,{set}_total,{set}_readiness,...` layout.
    pub fn parse_header(line: &str) -> Result<Vec<ControlSetName>, SnapshotParseError> {
        let line = line.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);
        let columns: Vec<&str> = line.split(',').collect();
        let Some((first, rest)) = columns.split_first() else {
            return Err(SnapshotParseError::Header("empty header".to_string()));
        };
        if *first != TIMESTAMP_COLUMN {
            return Err(SnapshotParseError::Header(format!(
                "first column must be {TIMESTAMP_COLUMN}, found {first:?}"
            )));
        }
        if rest.len() % 2 != 0 {
            return Err(SnapshotParseError::Header(
                "control set columns must come in total/readiness pairs".to_string(),
            ));
        }
        rest.chunks(2)
            .map(|pair| {
                let total = pair[0].strip_suffix(TOTAL_SUFFIX);
                let readiness = pair[1].strip_suffix(READINESS_SUFFIX);
                match (total, readiness) {
                    (Some(total), Some(readiness)) if total == readiness => {
                        ControlSetName::new(total)
                            .map_err(|err| SnapshotParseError::Header(err.to_string()))
                    }
                    _ => Err(SnapshotParseError::Header(format!(
                        "unpaired columns {:?} and {:?}",
                        pair[0], pair[1]
                    ))),
                }
            })
            .collect()
    }

    /// Parses one data row against the header's control sets.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotParseError`] when the row does not match the header.
    pub fn parse_row(
        control_sets: &[ControlSetName],
        line: &str,
    ) -> Result<Self, SnapshotParseError> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        let expected = 1 + control_sets.len() * 2;
        if fields.len() != expected {
            return Err(SnapshotParseError::FieldCount {
                expected,
                found: fields.len(),
            });
        }
        let timestamp = RunTimestamp::parse_ledger(fields[0])?;
        let entries = control_sets
            .iter()
            .zip(fields[1 ..].chunks(2))
            .map(|(name, pair)| {
                let total = pair[0].trim().parse::<u64>().map_err(|_| SnapshotParseError::Value {
                    column: name.total_column(),
                    value: pair[0].to_string(),
                })?;
                let readiness = pair[1]
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| SnapshotParseError::Value {
                        column: name.readiness_column(),
                        value: pair[1].to_string(),
                    })?;
                Ok(SnapshotEntry {
                    control_set: name.clone(),
                    total,
                    readiness,
                })
            })
            .collect::<Result<Vec<_>, SnapshotParseError>>()?;
        Ok(Self {
            timestamp,
            entries,
        })
    }
}

/// Builds the ledger header for control sets in column order.
#[must_use]
pub fn header_line_for<'a>(control_sets: impl IntoIterator<Item = &'a ControlSetName>) -> String {
    let mut header = String::from(TIMESTAMP_COLUMN);
    for name in control_sets {
        header.push(',');
        header.push_str(&name.total_column());
        header.push(',');
        header.push_str(&name.readiness_column());
    }
    header
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

    use super::HistorySnapshot;
    use super::SnapshotFormatError;
    use super::SnapshotParseError;
    use crate::core::identifiers::ControlSetName;
    use crate::core::kpi::KpiRecord;
    use crate::core::time::RunTimestamp;

    fn names() -> Vec<ControlSetName> {
        vec![ControlSetName::new("27001").unwrap(), ControlSetName::new("27701").unwrap()]
    }

    fn kpi(total: u64, readiness: f64) -> KpiRecord {
        KpiRecord {
            total,
            green: total,
            amber: 0,
            red: 0,
            readiness,
        }
    }

    #[test]
    fn header_and_row_follow_ledger_layout() {
        let sets = names();
        let first = kpi(3, 79.0);
        let second = kpi(2, 66.5);
        let ts = RunTimestamp::from_unix_seconds(1_760_000_000).unwrap();
        let snapshot = HistorySnapshot::from_kpis(ts, [(&sets[0], &first), (&sets[1], &second)]);
        assert_eq!(
            snapshot.header_line(),
            "timestamp,27001_total,27001_readiness,27701_total,27701_readiness"
        );
        assert_eq!(snapshot.to_row().unwrap(), "2025-10-09_08-53-20,3,79.0,2,66.5");
    }

    #[test]
    fn parse_row_reads_back_written_values() {
        let sets = names();
        let header = "timestamp,27001_total,27001_readiness,27701_total,27701_readiness";
        assert_eq!(HistorySnapshot::parse_header(header).unwrap(), sets);
        let row = HistorySnapshot::parse_row(&sets, "2025-10-09_08-53-20,3,79.0,0,0.0\r\n").unwrap();
        assert_eq!(row.entry("27001").map(|entry| entry.total), Some(3));
        assert_eq!(row.entry("27701").map(|entry| entry.readiness), Some(0.0));
    }

    #[test]
    fn to_row_rejects_non_finite_readiness() {
        let sets = names();
        let ts = RunTimestamp::from_unix_seconds(100).unwrap();
        for readiness in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let bad = kpi(2, readiness);
            let snapshot = HistorySnapshot::from_kpis(ts, [(&sets[0], &bad)]);
            assert_eq!(
                snapshot.to_row().unwrap_err(),
                SnapshotFormatError::NonFiniteReadiness {
                    control_set: sets[0].clone(),
                }
            );
        }
    }

    #[test]
    fn parse_header_rejects_unpaired_columns() {
        let err = HistorySnapshot::parse_header("timestamp,a_total,b_readiness").unwrap_err();
        assert!(matches!(err, SnapshotParseError::Header(_)));
        assert!(HistorySnapshot::parse_header("ts,a_total,a_readiness").is_err());
        assert!(HistorySnapshot::parse_header("timestamp,a_total").is_err());
    }

    #[test]
    fn parse_row_rejects_short_rows() {
        let err = HistorySnapshot::parse_row(&names(), "2025-10-09_08-53-20,3,79.0").unwrap_err();
        assert_eq!(
            err,
            SnapshotParseError::FieldCount {
                expected: 5,
                found: 3
            }
        );
    }
}
