// crates/compliance-kpi-core/src/interfaces/mod.rs
// ============================================================================
// Module: Compliance KPI Interfaces
// Description: Collaborator interfaces for control inputs and the history ledger.
// Purpose: Define the contract surfaces used by the run orchestrator.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces decouple the orchestrator from spreadsheet formats and ledger
//! storage. A [`ControlSource`] must fail loudly when input is missing; a
//! [`HistoryLedger`] must degrade to a fallback location instead of failing
//! when its primary store is blocked, and say so in its [`LedgerReceipt`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::ControlSetSpec;
use crate::core::ControlTable;
use crate::core::HistorySnapshot;
use crate::core::RunTimestamp;

// ============================================================================
// SECTION: Control Source
// ============================================================================

/// Input failures for a control set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Input sheet does not exist.
    #[error("control input not found: {0}")]
    NotFound(String),
    /// Input exists but could not be read.
    #[error("control input unreadable: {0}")]
    Io(String),
    /// Sheet was read but has no score column.
    #[error("sheet {sheet} has no score column {column:?}")]
    MissingScoreColumn {
        /// Sheet name.
        sheet: String,
        /// Expected column name.
        column: String,
    },
    /// Sheet content is not tabular.
    #[error("control input malformed: {0}")]
    Malformed(String),
}

/// Supplies raw tabular data for one control set (the sheet reader).
pub trait ControlSource {
    /// Loads the table for a control set.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the input is missing or unreadable.
    fn load(&self, control_set: &ControlSetSpec) -> Result<ControlTable, SourceError>;
}

// ============================================================================
// SECTION: History Ledger
// ============================================================================

/// Why a snapshot went to a fallback file instead of the primary ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// Primary ledger could not be opened for writing.
    Blocked {
        /// Underlying open error.
        error: String,
    },
    /// Primary ledger header lists different control sets.
    SchemaMismatch {
        /// Header found in the primary ledger.
        existing: String,
    },
    /// Primary ledger already holds a later run.
    OutOfOrder {
        /// Latest timestamp found in the primary ledger.
        last: RunTimestamp,
    },
}

/// Where a snapshot was actually written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// Path the caller asked for.
    pub requested: PathBuf,
    /// Path that received the row.
    pub written: PathBuf,
    /// Set when `written` is a fallback file.
    pub fallback: Option<FallbackReason>,
}

impl LedgerReceipt {
    /// Receipt for a write that landed in the primary ledger.
    #[must_use]
    pub fn primary(path: PathBuf) -> Self {
        Self {
            requested: path.clone(),
            written: path,
            fallback: None,
        }
    }

    /// Returns true when the write went to a fallback file.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Ledger failures that could not be absorbed by the fallback path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Filesystem failure on both primary and fallback paths.
    #[error("ledger io error: {0}")]
    Io(String),
    /// Existing ledger content does not parse.
    #[error("ledger {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        /// Ledger path.
        path: String,
        /// One-based line number.
        line: usize,
        /// Parse failure.
        reason: String,
    },
    /// Ledger path is unusable.
    #[error("invalid ledger path: {0}")]
    InvalidPath(String),
    /// Snapshot could not be rendered.
    #[error("ledger row formatting failed: {0}")]
    Format(String),
}

/// Append-only store of run snapshots.
pub trait HistoryLedger {
    /// Appends one snapshot row.
    ///
    /// Appending identical data twice produces two rows.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] only when neither the primary store nor a
    /// fallback could accept the row.
    fn append(&self, snapshot: &HistorySnapshot) -> Result<LedgerReceipt, LedgerError>;
}

// ============================================================================
// SECTION: Fallback Naming
// ============================================================================

/// Builds the sibling fallback path for a primary ledger.
///
/// `summary_history.csv` at `20251009_085320` becomes
/// `summary_history_20251009_085320.csv`; `attempt > 0` appends `_<attempt>`
/// so callers can probe for a free name.
///
/// # Errors
///
/// Returns [`LedgerError`] when the primary path has no file name or the
/// timestamp cannot be formatted.
pub fn fallback_path_for(
    primary: &Path,
    timestamp: RunTimestamp,
    attempt: u32,
) -> Result<PathBuf, LedgerError> {
    let stem = primary
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| LedgerError::InvalidPath(primary.display().to_string()))?;
    let extension = primary.extension().and_then(|ext| ext.to_str()).unwrap_or("csv");
    let stamp = timestamp.compact_text().map_err(|err| LedgerError::Format(err.to_string()))?;
    let name = if attempt == 0 {
        format!("{stem}_{stamp}.{extension}")
    } else {
        format!("{stem}_{stamp}_{attempt}.{extension}")
    };
    Ok(primary.with_file_name(name))
}
