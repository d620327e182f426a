// crates/compliance-kpi-core/src/lib.rs
// ============================================================================
// Module: Compliance KPI Core Library
// Description: Public API surface for the Compliance KPI core.
// Purpose: Expose KPI types, collaborator interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Compliance KPI core turns per-control-set score columns into readiness
//! KPIs and hands one snapshot per run to an append-only history ledger. It is
//! storage-agnostic: spreadsheets, ledger files, and log routing plug in
//! through the traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ControlSource;
pub use interfaces::FallbackReason;
pub use interfaces::HistoryLedger;
pub use interfaces::LedgerError;
pub use interfaces::LedgerReceipt;
pub use interfaces::SourceError;
pub use interfaces::fallback_path_for;
pub use runtime::AuditLevel;
pub use runtime::CoercedScores;
pub use runtime::ControlSetKpi;
pub use runtime::FileRunAuditSink;
pub use runtime::InMemoryControlSource;
pub use runtime::InMemoryHistoryLedger;
pub use runtime::InMemoryRunAuditSink;
pub use runtime::NoopRunAuditSink;
pub use runtime::RunAuditEvent;
pub use runtime::RunError;
pub use runtime::RunOrchestrator;
pub use runtime::RunAuditSink;
pub use runtime::RunReport;
pub use runtime::StderrRunAuditSink;
pub use runtime::aggregate;
pub use runtime::coerce_scores;

