// crates/compliance-kpi-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for compliance-kpi-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use compliance_kpi_config::ComplianceKpiConfig;
use compliance_kpi_config::ConfigError;

/// Minimal valid configuration with two control sets.
pub const TWO_SET_TOML: &str = r#"
input_file = "controls"
output_folder = "output"

[[control_sets]]
name = "27001"
label = "ISO 27001"

[[control_sets]]
name = "27701"
sheet = "ISO 27701"
"#;

/// Parses and validates a TOML string.
pub fn config_from_toml(toml_str: &str) -> Result<ComplianceKpiConfig, ConfigError> {
    ComplianceKpiConfig::from_toml(toml_str)
}

/// Returns the validation message for a TOML string expected to be invalid.
pub fn invalid_message(toml_str: &str) -> String {
    match config_from_toml(toml_str) {
        Err(ConfigError::Invalid(message)) => message,
        Err(other) => format!("unexpected error kind: {other}"),
        Ok(_) => "unexpectedly valid".to_string(),
    }
}

/// Builds a config with the given control-set names.
pub fn toml_with_sets(names: &[&str]) -> String {
    let mut toml_str = String::from("input_file = \"controls\"\n");
    for name in names {
        toml_str.push_str(&format!("\n[[control_sets]]\nname = \"{name}\"\n"));
    }
    toml_str
}
