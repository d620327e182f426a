// crates/compliance-kpi-config/src/config.rs
// ============================================================================
// Module: Compliance KPI Configuration
// Description: Configuration loading and validation for compliance runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: compliance-kpi-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, else the `COMPLIANCE_KPI_CONFIG`
//! environment variable, else `compliance-kpi.toml` in the working directory.
//! Relative paths inside a loaded file resolve against the file's directory.
//!
//! ```toml
//! input_file = "controls"
//! score_column = "Compliance Score (%)"
//! output_folder = "output"
//!
//! [[control_sets]]
//! name = "27001"
//! label = "ISO 27001"
//!
//! [[control_sets]]
//! name = "27701"
//! sheet = "ISO 27701"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use compliance_kpi_core::ControlSetName;
use compliance_kpi_core::ControlSetSpec;
use compliance_kpi_core::DEFAULT_LEDGER_NAME;
use compliance_kpi_core::RunConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "compliance-kpi.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "COMPLIANCE_KPI_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum number of control sets per run.
pub const MAX_CONTROL_SETS: usize = 32;
/// Default score column name.
pub const DEFAULT_SCORE_COLUMN: &str = "Compliance Score (%)";
/// Default output folder.
pub const DEFAULT_OUTPUT_FOLDER: &str = "output";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a control-set label.
const MAX_LABEL_LENGTH: usize = 256;
/// Required extension of the ledger file.
const LEDGER_EXTENSION: &str = "csv";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Compliance KPI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplianceKpiConfig {
    /// Workbook directory of CSV sheets, or one CSV sheet file.
    pub input_file: PathBuf,
    /// Score column name shared by every sheet.
    #[serde(default = "default_score_column")]
    pub score_column: String,
    /// Directory holding the history ledger.
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
    /// Ledger file name inside `output_folder`.
    #[serde(default = "default_ledger_name")]
    pub ledger_name: String,
    /// Control sets in ledger column order.
    #[serde(default)]
    pub control_sets: Vec<ControlSetConfig>,
    /// Run log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Directory of the loaded file; relative paths resolve against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// One configured control set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSetConfig {
    /// Control-set name used in ledger columns.
    pub name: String,
    /// Optional display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Optional sheet name; defaults to `name`.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Run log configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// JSON-lines log file; stderr when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Returns the default score column.
fn default_score_column() -> String {
    DEFAULT_SCORE_COLUMN.to_string()
}

/// Returns the default output folder.
fn default_output_folder() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FOLDER)
}

/// Returns the default ledger name.
fn default_ledger_name() -> String {
    DEFAULT_LEDGER_NAME.to_string()
}

impl ComplianceKpiConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.base_dir = resolved
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("input_file", &self.input_file)?;
        validate_path_string("output_folder", &self.output_folder)?;
        if self.score_column.trim().is_empty() {
            return Err(ConfigError::Invalid("score_column must be non-empty".to_string()));
        }
        validate_ledger_name(&self.ledger_name)?;
        self.validate_control_sets()?;
        if is_csv_file(&self.input_file) && self.control_sets.len() > 1 {
            return Err(ConfigError::Invalid(
                "a single csv input_file supports exactly one control set".to_string(),
            ));
        }
        if let Some(path) = &self.logging.path {
            validate_path_string("logging.path", path)?;
        }
        Ok(())
    }

    /// Validates the control-set list.
    fn validate_control_sets(&self) -> Result<(), ConfigError> {
        if self.control_sets.is_empty() {
            return Err(ConfigError::Invalid("control_sets must be non-empty".to_string()));
        }
        if self.control_sets.len() > MAX_CONTROL_SETS {
            return Err(ConfigError::Invalid(format!(
                "control_sets exceeds max of {MAX_CONTROL_SETS}"
            )));
        }
        let mut seen = BTreeSet::new();
        for (index, control_set) in self.control_sets.iter().enumerate() {
            ControlSetName::new(control_set.name.as_str()).map_err(|err| {
                ConfigError::Invalid(format!("control_sets[{index}].name: {err}"))
            })?;
            if !seen.insert(control_set.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate control set: {}",
                    control_set.name
                )));
            }
            if let Some(label) = &control_set.label
                && (label.trim().is_empty() || label.len() > MAX_LABEL_LENGTH)
            {
                return Err(ConfigError::Invalid(format!(
                    "control_sets[{index}].label must be 1..={MAX_LABEL_LENGTH} bytes"
                )));
            }
            if let Some(sheet) = &control_set.sheet {
                validate_sheet_name(index, sheet)?;
            }
        }
        Ok(())
    }

    /// Returns the ledger path after base-directory resolution.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.resolve(&self.output_folder).join(&self.ledger_name)
    }

    /// Returns the log file path after base-directory resolution.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.logging.path.as_deref().map(|path| self.resolve(path))
    }

    /// Projects the file model into a core run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a control-set name is invalid.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let control_sets = self
            .control_sets
            .iter()
            .map(|control_set| {
                let name = ControlSetName::new(control_set.name.as_str())
                    .map_err(|err| ConfigError::Invalid(err.to_string()))?;
                Ok(ControlSetSpec {
                    name,
                    label: control_set.label.clone(),
                    sheet: control_set.sheet.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(RunConfig {
            input_file: self.resolve(&self.input_file),
            score_column: self.score_column.clone(),
            output_folder: self.resolve(&self.output_folder),
            ledger_name: self.ledger_name.clone(),
            control_sets,
        })
    }

    /// Resolves a configured path against the config directory.
    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path against length constraints.
fn validate_path_string(field: &str, value: &Path) -> Result<(), ConfigError> {
    let text = value.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in value.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates that the ledger name is a bare `.csv` file name.
fn validate_ledger_name(name: &str) -> Result<(), ConfigError> {
    let path = Path::new(name);
    let mut components = path.components();
    let bare = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !bare || name.contains(['/', '\\']) || name.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ConfigError::Invalid(format!("ledger_name must be a bare file name: {name}")));
    }
    if !is_csv_file(path) || path.file_stem().is_none_or(|stem| stem.is_empty()) {
        return Err(ConfigError::Invalid(format!("ledger_name must end in .csv: {name}")));
    }
    Ok(())
}

/// Validates a sheet name override.
fn validate_sheet_name(index: usize, sheet: &str) -> Result<(), ConfigError> {
    if sheet.trim().is_empty()
        || sheet.contains(['/', '\\'])
        || sheet == "."
        || sheet == ".."
        || sheet.len() > MAX_PATH_COMPONENT_LENGTH
    {
        return Err(ConfigError::Invalid(format!("control_sets[{index}].sheet is invalid: {sheet}")));
    }
    Ok(())
}

/// Returns true when the path names a `.csv` file.
fn is_csv_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(LEDGER_EXTENSION))
}
