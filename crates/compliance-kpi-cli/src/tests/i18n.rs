// crates/compliance-kpi-cli/src/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Unit tests for catalog lookups and placeholder substitution.
// Purpose: Ensure CLI messages render predictably.
// Dependencies: compliance-kpi-cli i18n module
// ============================================================================

//! ## Overview
//! Verifies catalog keys are unique, placeholders are substituted, and
//! unknown keys fall back to the key text.

use std::collections::BTreeSet;

use crate::i18n::CATALOG_ITEMS;
use crate::i18n::MessageArg;
use crate::i18n::catalog;
use crate::i18n::translate;

#[test]
fn catalog_keys_are_unique() {
    let keys: BTreeSet<&str> = CATALOG_ITEMS.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys.len(), CATALOG_ITEMS.len());
    assert_eq!(catalog().len(), CATALOG_ITEMS.len());
}

#[test]
fn translate_substitutes_placeholders() {
    let output = translate(
        "run.kpi_line",
        vec![
            MessageArg::new("label", "ISO 27001"),
            MessageArg::new("total", "3"),
            MessageArg::new("green", "1"),
            MessageArg::new("amber", "1"),
            MessageArg::new("red", "1"),
            MessageArg::new("readiness", "79.0"),
        ],
    );
    assert_eq!(
        output,
        "ISO 27001: 3 controls (1 green, 1 amber, 1 red), readiness 79.0%"
    );
}

#[test]
fn translate_leaves_missing_placeholders_visible() {
    let output = translate("run.failed", Vec::new());
    assert_eq!(output, "Run failed: {error}");
}

#[test]
fn unknown_key_falls_back_to_key() {
    assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
}

#[test]
fn macro_formats_named_arguments() {
    let output = crate::t!("history.empty", path = "out/summary_history.csv");
    assert_eq!(output, "No runs recorded in out/summary_history.csv.");
}
