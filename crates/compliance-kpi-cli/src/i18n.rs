// crates/compliance-kpi-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Provides the message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings so output stays consistent.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The compliance-kpi CLI stores user-facing strings in a small catalog so
//! every command words its output the same way. All runtime output should be
//! routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve argument order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the message bundle.
pub(crate) const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "compliance-kpi {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.json_failed", "Failed to render JSON output: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("config.validate.summary", "Control sets: {control_sets}. Ledger: {ledger}"),
    ("run.at_invalid", "Invalid --at value {value}: {error}"),
    ("run.audit_open_failed", "Failed to open run log {path}: {error}"),
    ("run.ledger_open_failed", "Failed to open history ledger: {error}"),
    ("run.failed", "Run failed: {error}"),
    ("run.header", "Run {timestamp}"),
    (
        "run.kpi_line",
        "{label}: {total} controls ({green} green, {amber} amber, {red} red), readiness {readiness}%",
    ),
    ("run.dropped", "  {count} row(s) skipped: score is not numeric"),
    ("run.ledger_written", "History appended to {path}"),
    (
        "run.fallback.blocked",
        "Warning: ledger {path} is not writable ({error}). Snapshot written to {written} instead.",
    ),
    (
        "run.fallback.schema_mismatch",
        "Warning: ledger {path} tracks different control sets ({existing}). Snapshot written to \
         {written} instead.",
    ),
    (
        "run.fallback.out_of_order",
        "Warning: ledger {path} already holds a later run ({last}). Snapshot written to {written} \
         instead.",
    ),
    ("history.read_failed", "Failed to read history: {error}"),
    ("history.empty", "No runs recorded in {path}."),
    ("history.sources", "Read {count} ledger file(s)."),
    ("history.skipped", "Skipped {path}: control sets differ from the primary ledger."),
    ("history.deltas", "Readiness change since the previous run:"),
    ("history.delta", "  {control_set}: {previous}% -> {current}% ({delta})"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static catalog used by the CLI.
pub(crate) fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
