// crates/compliance-kpi-core/src/core/run.rs
// ============================================================================
// Module: Compliance KPI Run Configuration
// Description: Inputs consumed by the run orchestrator.
// Purpose: Describe which control sets to aggregate and where the ledger lives.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! [`RunConfig`] is the runtime projection of the on-disk configuration. It
//! is deliberately small: input location, score column, output folder, and
//! the ordered list of control sets. The order of `control_sets` fixes the
//! ledger column order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ControlSetName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default file name of the primary history ledger.
pub const DEFAULT_LEDGER_NAME: &str = "summary_history.csv";

// ============================================================================
// SECTION: Control Set Spec
// ============================================================================

/// One configured control set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSetSpec {
    /// Ledger name of the control set.
    pub name: ControlSetName,
    /// Optional human-readable label (for example `ISO 27001`).
    #[serde(default)]
    pub label: Option<String>,
    /// Optional sheet name inside the input workbook.
    #[serde(default)]
    pub sheet: Option<String>,
}

impl ControlSetSpec {
    /// Creates a spec with no label and the default sheet.
    #[must_use]
    pub const fn new(name: ControlSetName) -> Self {
        Self {
            name,
            label: None,
            sheet: None,
        }
    }

    /// Returns the label, falling back to the name.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.name.as_str())
    }

    /// Returns the sheet name, falling back to the name.
    #[must_use]
    pub fn sheet_name(&self) -> &str {
        self.sheet.as_deref().unwrap_or_else(|| self.name.as_str())
    }
}

// ============================================================================
// SECTION: Run Config
// ============================================================================

/// Inputs for a single orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Input workbook location handed to the control source.
    pub input_file: PathBuf,
    /// Name of the score column in every control sheet.
    pub score_column: String,
    /// Directory holding the history ledger.
    pub output_folder: PathBuf,
    /// File name of the primary ledger inside `output_folder`.
    pub ledger_name: String,
    /// Control sets in ledger column order.
    pub control_sets: Vec<ControlSetSpec>,
}

impl RunConfig {
    /// Returns the primary ledger path.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.output_folder.join(&self.ledger_name)
    }
}
