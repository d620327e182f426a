// crates/compliance-kpi-store/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared snapshot builders for store tests.
// Purpose: Provide deterministic snapshots and ledger helpers.
// Dependencies: compliance-kpi-core
// ============================================================================

//! ## Overview
//! Builders for history snapshots with fixed timestamps and helpers for
//! inspecting ledger files on disk.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

use std::fs;
use std::path::Path;

use compliance_kpi_core::ControlSetName;
use compliance_kpi_core::HistorySnapshot;
use compliance_kpi_core::KpiRecord;
use compliance_kpi_core::RunTimestamp;

/// Header for the two-set ledger used across tests.
pub const TWO_SET_HEADER: &str = "timestamp,27001_total,27001_readiness,27701_total,27701_readiness";

/// Returns a timestamp `seconds` after the Unix epoch.
pub fn at(seconds: i64) -> RunTimestamp {
    RunTimestamp::from_unix_seconds(seconds).unwrap()
}

/// Builds a snapshot from `(name, total, readiness)` triples.
pub fn snapshot(timestamp: RunTimestamp, entries: &[(&str, u64, f64)]) -> HistorySnapshot {
    let names: Vec<ControlSetName> =
        entries.iter().map(|(name, _, _)| ControlSetName::new(*name).unwrap()).collect();
    let kpis: Vec<KpiRecord> = entries
        .iter()
        .map(|(_, total, readiness)| KpiRecord {
            total: *total,
            green: *total,
            amber: 0,
            red: 0,
            readiness: *readiness,
        })
        .collect();
    HistorySnapshot::from_kpis(timestamp, names.iter().zip(kpis.iter()))
}

/// Builds a two-set snapshot.
pub fn two_set(timestamp: RunTimestamp, iso: f64, privacy: f64) -> HistorySnapshot {
    snapshot(timestamp, &[("27001", 10, iso), ("27701", 4, privacy)])
}

/// Returns the non-empty lines of a file.
pub fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
