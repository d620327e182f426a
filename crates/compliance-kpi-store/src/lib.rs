// crates/compliance-kpi-store/src/lib.rs
// ============================================================================
// Module: Compliance KPI Store Library
// Description: Filesystem adapters for control sheets and the history ledger.
// Purpose: Implement the core collaborator traits over CSV files.
// Dependencies: compliance-kpi-core, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate binds the storage-agnostic core to the filesystem:
//! [`FileHistoryLedger`] appends run snapshots to a CSV ledger with fallback
//! files, [`read_history`] reads ledgers back for reporting, and
//! [`CsvWorkbookSource`] loads control sheets exported as CSV.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod csv;
pub mod history;
pub mod ledger;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use csv::CsvError;
pub use csv::CsvRecord;
pub use csv::parse_records;
pub use history::CombinedHistory;
pub use history::LedgerHistory;
pub use history::ReadinessDelta;
pub use history::list_fallback_files;
pub use history::parse_history;
pub use history::read_history;
pub use history::read_history_with_fallbacks;
pub use ledger::FileHistoryLedger;
pub use ledger::MAX_FALLBACK_ATTEMPTS;
pub use ledger::append_snapshot;
pub use source::CsvWorkbookSource;
pub use source::MAX_SHEET_BYTES;
pub use source::SHEET_EXTENSION;
pub use source::parse_table;
