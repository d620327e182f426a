// crates/compliance-kpi-core/src/runtime/mod.rs
// ============================================================================
// Module: Compliance KPI Runtime
// Description: Coercion, aggregation, orchestration, and run logging.
// Purpose: Execute compliance runs against pluggable collaborators.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime holds the pure KPI pipeline ([`coerce_scores`], [`aggregate`])
//! and the [`RunOrchestrator`] that sequences it against a control source and
//! a history ledger.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregate;
pub mod audit;
pub mod coerce;
pub mod orchestrator;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::aggregate;
pub use audit::AuditLevel;
pub use audit::FileRunAuditSink;
pub use audit::InMemoryRunAuditSink;
pub use audit::NoopRunAuditSink;
pub use audit::RunAuditEvent;
pub use audit::RunAuditSink;
pub use audit::StderrRunAuditSink;
pub use coerce::CoercedScores;
pub use coerce::coerce_scores;
pub use orchestrator::ControlSetKpi;
pub use orchestrator::RunError;
pub use orchestrator::RunOrchestrator;
pub use orchestrator::RunReport;
pub use store::InMemoryControlSource;
pub use store::InMemoryHistoryLedger;
