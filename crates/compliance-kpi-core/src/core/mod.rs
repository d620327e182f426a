// crates/compliance-kpi-core/src/core/mod.rs
// ============================================================================
// Module: Compliance KPI Core Types
// Description: Canonical KPI, snapshot, and run-input structures.
// Purpose: Provide stable, serializable types shared by every crate.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types define control-set identifiers, raw control tables, KPI records,
//! and ledger snapshots. They are the canonical source of truth for the ledger
//! file schema and for any report or dashboard consumer.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod kpi;
pub mod record;
pub mod run;
pub mod snapshot;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::ControlSetName;
pub use identifiers::ControlSetNameError;
pub use identifiers::MAX_CONTROL_SET_NAME_BYTES;
pub use kpi::AMBER_THRESHOLD;
pub use kpi::GREEN_THRESHOLD;
pub use kpi::KpiRecord;
pub use kpi::RagBucket;
pub use kpi::round_one_decimal;
pub use record::ControlRecord;
pub use record::ControlTable;
pub use record::RawScore;
pub use run::ControlSetSpec;
pub use run::DEFAULT_LEDGER_NAME;
pub use run::RunConfig;
pub use snapshot::HistorySnapshot;
pub use snapshot::SnapshotEntry;
pub use snapshot::SnapshotFormatError;
pub use snapshot::SnapshotParseError;
pub use snapshot::TIMESTAMP_COLUMN;
pub use snapshot::header_line_for;
pub use self::time::RunTimestamp;
pub use self::time::TimestampError;
