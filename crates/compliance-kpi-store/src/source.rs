// crates/compliance-kpi-store/src/source.rs
// ============================================================================
// Module: CSV Control Sheet Source
// Description: ControlSource backed by per-sheet CSV files.
// Purpose: Load control-set tables from a workbook exported as CSV sheets.
// Dependencies: compliance-kpi-core, crate::csv
// ============================================================================

//! ## Overview
//! A workbook is a directory holding one `<sheet>.csv` file per control set.
//! A single `.csv` file may stand in for the workbook when only one control
//! set is configured. Numeric-looking cells become numbers, blank cells
//! become empty values, and everything else stays text so score coercion can
//! drop it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use compliance_kpi_core::ControlRecord;
use compliance_kpi_core::ControlSetSpec;
use compliance_kpi_core::ControlSource;
use compliance_kpi_core::ControlTable;
use compliance_kpi_core::RawScore;
use compliance_kpi_core::SourceError;

use crate::csv::parse_records;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extension of exported sheets.
pub const SHEET_EXTENSION: &str = "csv";
/// Maximum size of a single sheet file.
pub const MAX_SHEET_BYTES: u64 = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Source
// ============================================================================

/// Control source reading CSV sheets from a workbook directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvWorkbookSource {
    /// Workbook directory, or a single sheet file.
    root: PathBuf,
}

impl CsvWorkbookSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the sheet file used for a control set.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Malformed`] when the sheet name would escape the
    /// workbook directory.
    pub fn sheet_path(&self, control_set: &ControlSetSpec) -> Result<PathBuf, SourceError> {
        if is_single_sheet(&self.root) {
            return Ok(self.root.clone());
        }
        let sheet = control_set.sheet_name();
        if sheet.is_empty() || sheet.contains(['/', '\\']) || sheet == "." || sheet == ".." {
            return Err(SourceError::Malformed(format!("invalid sheet name: {sheet}")));
        }
        Ok(self.root.join(format!("{sheet}.{SHEET_EXTENSION}")))
    }
}

impl ControlSource for CsvWorkbookSource {
    fn load(&self, control_set: &ControlSetSpec) -> Result<ControlTable, SourceError> {
        let path = self.sheet_path(control_set)?;
        let text = read_sheet(&path)?;
        parse_table(&text).map_err(|reason| {
            SourceError::Malformed(format!("{}: {reason}", path.display()))
        })
    }
}

/// Returns true when `root` names a sheet file rather than a directory.
fn is_single_sheet(root: &Path) -> bool {
    root.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(SHEET_EXTENSION))
        && !root.is_dir()
}

/// Reads a sheet file with a size limit.
fn read_sheet(path: &Path) -> Result<String, SourceError> {
    let file = fs::File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
        _ => SourceError::Io(format!("{}: {err}", path.display())),
    })?;
    let mut bytes = Vec::new();
    file.take(MAX_SHEET_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| SourceError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() as u64 > MAX_SHEET_BYTES {
        return Err(SourceError::Malformed(format!(
            "{} exceeds {MAX_SHEET_BYTES} bytes",
            path.display()
        )));
    }
    String::from_utf8(bytes)
        .map_err(|_| SourceError::Malformed(format!("{} is not valid UTF-8", path.display())))
}

// ============================================================================
// SECTION: Table Parsing
// ============================================================================

/// Parses sheet text into a control table keyed by header names.
///
/// # Errors
///
/// Returns a description when the text is not tabular.
pub fn parse_table(text: &str) -> Result<ControlTable, String> {
    let records = parse_records(text).map_err(|err| err.to_string())?;
    let mut records = records.into_iter();
    let Some(header) = records.next() else {
        return Ok(ControlTable::default());
    };
    let columns: Vec<String> =
        header.fields.iter().map(|name| name.trim().to_string()).collect();
    let mut rows = Vec::new();
    for record in records {
        if record.fields.len() > columns.len() {
            return Err(format!(
                "line {}: {} fields but header has {}",
                record.line,
                record.fields.len(),
                columns.len()
            ));
        }
        let fields: BTreeMap<String, RawScore> = columns
            .iter()
            .zip(record.fields)
            .filter(|(column, _)| !column.is_empty())
            .map(|(column, value)| (column.clone(), cell_value(value)))
            .collect();
        rows.push(ControlRecord {
            fields,
        });
    }
    Ok(ControlTable::new(columns, rows))
}

/// Converts one cell to a raw score.
fn cell_value(value: String) -> RawScore {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return RawScore::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => RawScore::Number(number),
        _ => RawScore::Text(value),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
