// crates/compliance-kpi-store/src/history.rs
// ============================================================================
// Module: Ledger Reader
// Description: Reads history ledgers and their fallback files.
// Purpose: Give reports a timestamp-sorted view of recorded runs.
// Dependencies: compliance-kpi-core, serde
// ============================================================================

//! ## Overview
//! Reading is strict: a ledger that does not parse is reported as
//! [`LedgerError::Corrupt`] with the offending line. Rows are returned sorted
//! by run timestamp (stable for equal timestamps) regardless of file order.
//! Fallback files are discovered next to the primary ledger and can be merged
//! into one in-memory view; files on disk are never modified.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use compliance_kpi_core::ControlSetName;
use compliance_kpi_core::HistorySnapshot;
use compliance_kpi_core::LedgerError;
use compliance_kpi_core::round_one_decimal;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Parsed ledger content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerHistory {
    /// Control sets in header order; empty when the ledger has no header.
    pub control_sets: Vec<ControlSetName>,
    /// Rows sorted by timestamp.
    pub rows: Vec<HistorySnapshot>,
}

/// Readiness change between the two most recent runs of a control set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessDelta {
    /// Control set name.
    pub control_set: ControlSetName,
    /// Readiness in the previous run.
    pub previous: f64,
    /// Readiness in the latest run.
    pub current: f64,
    /// `current - previous`, one decimal place.
    pub delta: f64,
}

impl LedgerHistory {
    /// Returns true when no rows are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the most recent row.
    #[must_use]
    pub fn latest(&self) -> Option<&HistorySnapshot> {
        self.rows.last()
    }

    /// Returns the readiness change for `control_set` between the two most
    /// recent runs, or `None` when fewer than two runs are recorded.
    #[must_use]
    pub fn latest_delta(&self, control_set: &str) -> Option<ReadinessDelta> {
        let [.., previous, current] = self.rows.as_slice() else {
            return None;
        };
        let before = previous.entry(control_set)?;
        let after = current.entry(control_set)?;
        Some(ReadinessDelta {
            control_set: after.control_set.clone(),
            previous: before.readiness,
            current: after.readiness,
            delta: round_one_decimal(after.readiness - before.readiness),
        })
    }

    /// Returns the latest delta for every control set, in header order.
    #[must_use]
    pub fn latest_deltas(&self) -> Vec<ReadinessDelta> {
        self.control_sets.iter().filter_map(|name| self.latest_delta(name.as_str())).collect()
    }

    /// Sorts rows by timestamp, keeping file order for ties.
    fn sort(&mut self) {
        self.rows.sort_by_key(|row| row.timestamp);
    }
}

/// Primary ledger merged with its fallback files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedHistory {
    /// Merged, timestamp-sorted history.
    pub history: LedgerHistory,
    /// Files whose rows were merged.
    pub sources: Vec<PathBuf>,
    /// Fallback files skipped because their header differs.
    pub skipped: Vec<PathBuf>,
}

// ============================================================================
// SECTION: Reading
// ============================================================================

/// Reads a ledger file. A missing file reads as an empty history.
///
/// # Errors
///
/// Returns [`LedgerError::Io`] when the file cannot be read and
/// [`LedgerError::Corrupt`] when its content does not parse.
pub fn read_history(path: &Path) -> Result<LedgerHistory, LedgerError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LedgerHistory::default()),
        Err(err) => return Err(LedgerError::Io(format!("{}: {err}", path.display()))),
    };
    parse_history(path, &text)
}

/// Parses ledger text read from `path`.
///
/// # Errors
///
/// Returns [`LedgerError::Corrupt`] naming the first line that does not parse.
pub fn parse_history(path: &Path, text: &str) -> Result<LedgerHistory, LedgerError> {
    let corrupt = |line: usize, reason: String| LedgerError::Corrupt {
        path: path.display().to_string(),
        line,
        reason,
    };
    let mut history = LedgerHistory::default();
    let mut header_seen = false;
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;
        if header_seen {
            let row = HistorySnapshot::parse_row(&history.control_sets, line)
                .map_err(|err| corrupt(line_number, err.to_string()))?;
            history.rows.push(row);
        } else {
            history.control_sets = HistorySnapshot::parse_header(line)
                .map_err(|err| corrupt(line_number, err.to_string()))?;
            header_seen = true;
        }
    }
    history.sort();
    Ok(history)
}

// ============================================================================
// SECTION: Fallback Discovery
// ============================================================================

/// Lists fallback files written next to `primary`, sorted by file name.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidPath`] when `primary` has no file name and
/// [`LedgerError::Io`] when the directory cannot be listed.
pub fn list_fallback_files(primary: &Path) -> Result<Vec<PathBuf>, LedgerError> {
    let stem = primary
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| LedgerError::InvalidPath(primary.display().to_string()))?;
    let extension = primary.extension().and_then(|ext| ext.to_str()).unwrap_or("csv");
    let dir = match primary.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(LedgerError::Io(format!("{}: {err}", dir.display()))),
    };
    let prefix = format!("{stem}_");
    let suffix = format!(".{extension}");
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| LedgerError::Io(format!("{}: {err}", dir.display())))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(middle) = name.strip_prefix(&prefix).and_then(|rest| rest.strip_suffix(&suffix))
            && is_fallback_stamp(middle)
            && entry.path().is_file()
        {
            found.push(entry.path());
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(found)
}

/// Returns true for `YYYYMMDD_HHMMSS` optionally followed by `_<n>`.
fn is_fallback_stamp(text: &str) -> bool {
    let mut parts = text.split('_');
    let (Some(date), Some(time)) = (parts.next(), parts.next()) else {
        return false;
    };
    let counter_ok = match parts.next() {
        None => true,
        Some(counter) => !counter.is_empty() && all_digits(counter) && parts.next().is_none(),
    };
    date.len() == 8 && all_digits(date) && time.len() == 6 && all_digits(time) && counter_ok
}

/// Returns true when every byte is an ASCII digit.
fn all_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Reads the primary ledger and every fallback file with the same header
/// into one timestamp-sorted history.
///
/// # Errors
///
/// Returns [`LedgerError`] when the primary ledger or a fallback file cannot
/// be read or does not parse.
pub fn read_history_with_fallbacks(primary: &Path) -> Result<CombinedHistory, LedgerError> {
    let mut combined = CombinedHistory::default();
    let base = read_history(primary)?;
    if !base.control_sets.is_empty() {
        combined.sources.push(primary.to_path_buf());
    }
    combined.history = base;
    for path in list_fallback_files(primary)? {
        let fallback = read_history(&path)?;
        if combined.history.control_sets.is_empty() {
            combined.history.control_sets.clone_from(&fallback.control_sets);
        }
        if fallback.control_sets == combined.history.control_sets {
            combined.history.rows.extend(fallback.rows);
            combined.sources.push(path);
        } else {
            combined.skipped.push(path);
        }
    }
    combined.history.sort();
    Ok(combined)
}
