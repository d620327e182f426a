// crates/compliance-kpi-core/src/core/record.rs
// ============================================================================
// Module: Compliance KPI Control Records
// Description: Tabular control data as returned by input collaborators.
// Purpose: Carry raw rows from a sheet reader into score coercion.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ControlTable`] is whatever a sheet reader produced for one control set:
//! named columns and rows of raw cells. Only the score column matters to this
//! crate; descriptive fields are carried through untouched and discarded after
//! aggregation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Raw Cells
// ============================================================================

/// A raw cell value before score coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawScore {
    /// Cell was already numeric.
    Number(f64),
    /// Cell was text (possibly numeric text, possibly not).
    Text(String),
    /// Cell was blank or absent.
    Empty,
}

impl From<f64> for RawScore {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for RawScore {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for RawScore {
    fn from(value: &str) -> Self {
        if value.is_empty() { Self::Empty } else { Self::Text(value.to_string()) }
    }
}

impl From<String> for RawScore {
    fn from(value: String) -> Self {
        if value.is_empty() { Self::Empty } else { Self::Text(value) }
    }
}

// ============================================================================
// SECTION: Rows and Tables
// ============================================================================

/// One control row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlRecord {
    /// Cell values keyed by column name.
    pub fields: BTreeMap<String, RawScore>,
}

impl ControlRecord {
    /// Creates a row from `(column, value)` pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<RawScore>,
    {
        Self {
            fields: pairs.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }

    /// Returns the raw value for a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RawScore> {
        self.fields.get(column)
    }
}

/// Tabular data for one control set.
///
/// # Invariants
/// - `columns` preserves the source header order.
/// - Rows may omit columns; an omitted cell reads as [`RawScore::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlTable {
    /// Header columns in source order.
    pub columns: Vec<String>,
    /// Data rows.
    pub rows: Vec<ControlRecord>,
}

impl ControlTable {
    /// Creates a table with the given header and rows.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<ControlRecord>) -> Self {
        Self {
            columns,
            rows,
        }
    }

    /// Builds a single-column table from raw score values.
    #[must_use]
    pub fn from_scores(column: &str, scores: impl IntoIterator<Item = RawScore>) -> Self {
        let rows = scores
            .into_iter()
            .map(|score| ControlRecord {
                fields: BTreeMap::from([(column.to_string(), score)]),
            })
            .collect();
        Self {
            columns: vec![column.to_string()],
            rows,
        }
    }

    /// Returns true when the header declares the column.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|candidate| candidate == column)
    }

    /// Returns the raw cells of one column, or `None` when the header lacks it.
    #[must_use]
    pub fn column_values(&self, column: &str) -> Option<Vec<RawScore>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.get(column).cloned().unwrap_or(RawScore::Empty))
                .collect(),
        )
    }
}
