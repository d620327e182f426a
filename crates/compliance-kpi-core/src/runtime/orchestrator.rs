// crates/compliance-kpi-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator
// Description: Drives one compliance run from inputs to ledger row.
// Purpose: Load, coerce, aggregate, snapshot, and append in a fixed order.
// Dependencies: crate::core, crate::interfaces, crate::runtime, thiserror
// ============================================================================

//! ## Overview
//! A run is all-or-nothing on input: every configured control set is loaded
//! before anything is aggregated, and any input failure aborts the run
//! without touching the ledger. Once inputs are in hand, the run always
//! produces exactly one ledger row, either in the primary ledger or in a
//! fallback file reported through the [`LedgerReceipt`].
//!
//! ## Run Sequence
//! 1. Validate the control-set list.
//! 2. Load each control set and check its score column.
//! 3. Coerce and aggregate each score column.
//! 4. Build one [`HistorySnapshot`] stamped with the run time.
//! 5. Append the snapshot to the [`HistoryLedger`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::core::ControlSetName;
use crate::core::HistorySnapshot;
use crate::core::KpiRecord;
use crate::core::RawScore;
use crate::core::RunConfig;
use crate::core::RunTimestamp;
use crate::interfaces::ControlSource;
use crate::interfaces::HistoryLedger;
use crate::interfaces::LedgerError;
use crate::interfaces::LedgerReceipt;
use crate::interfaces::SourceError;
use crate::runtime::aggregate::aggregate;
use crate::runtime::audit::RunAuditEvent;
use crate::runtime::audit::RunAuditSink;
use crate::runtime::coerce::coerce_scores;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Run failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// No control sets were configured.
    #[error("run has no control sets")]
    NoControlSets,
    /// A control set appears more than once.
    #[error("control set {0} is configured more than once")]
    DuplicateControlSet(ControlSetName),
    /// A control set's input could not be loaded.
    #[error("input for control set {control_set} failed: {source}")]
    Input {
        /// Control set whose input failed.
        control_set: ControlSetName,
        /// Underlying source failure.
        source: SourceError,
    },
    /// Neither the primary ledger nor a fallback accepted the row.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl RunError {
    /// Returns the control set tied to this failure, if any.
    #[must_use]
    pub const fn control_set(&self) -> Option<&ControlSetName> {
        match self {
            Self::DuplicateControlSet(name)
            | Self::Input {
                control_set: name, ..
            } => Some(name),
            Self::NoControlSets | Self::Ledger(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// KPI outcome for one control set in a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSetKpi {
    /// Control set name.
    pub name: ControlSetName,
    /// Display label.
    pub label: String,
    /// Aggregated KPIs.
    pub kpi: KpiRecord,
    /// Score cells dropped as empty or malformed.
    pub dropped: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Run timestamp written to the ledger.
    pub timestamp: RunTimestamp,
    /// Per-control-set outcomes in configured order.
    pub control_sets: Vec<ControlSetKpi>,
    /// Snapshot appended to the ledger.
    pub snapshot: HistorySnapshot,
    /// Where the snapshot landed.
    pub ledger: LedgerReceipt,
}

impl RunReport {
    /// Returns the KPIs for one control set.
    #[must_use]
    pub fn kpi(&self, name: &str) -> Option<&KpiRecord> {
        self.control_sets.iter().find(|entry| entry.name.as_str() == name).map(|entry| &entry.kpi)
    }

    /// Returns KPIs keyed by control-set name.
    #[must_use]
    pub fn kpis_by_name(&self) -> BTreeMap<ControlSetName, KpiRecord> {
        self.control_sets.iter().map(|entry| (entry.name.clone(), entry.kpi)).collect()
    }

    /// Returns the path that received the ledger row.
    #[must_use]
    pub fn ledger_path(&self) -> &Path {
        &self.ledger.written
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Runs the load, aggregate, and append pipeline.
pub struct RunOrchestrator<S, L, A> {
    /// Control input reader.
    source: S,
    /// History ledger.
    ledger: L,
    /// Run event sink.
    audit: A,
}

impl<S, L, A> RunOrchestrator<S, L, A>
where
    S: ControlSource,
    L: HistoryLedger,
    A: RunAuditSink,
{
    /// Creates an orchestrator from its collaborators.
    pub const fn new(source: S, ledger: L, audit: A) -> Self {
        Self {
            source,
            ledger,
            audit,
        }
    }

    /// Returns the history ledger.
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Executes one run stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when the configuration is unusable, any control
    /// set input fails, or the ledger rejects the row on every path.
    pub fn run(&self, config: &RunConfig, now: RunTimestamp) -> Result<RunReport, RunError> {
        let result = self.run_inner(config, now);
        if let Err(err) = &result {
            self.audit.record(&RunAuditEvent::RunFailed {
                run_at: now,
                control_set: err.control_set().cloned(),
                error: err.to_string(),
            });
        }
        result
    }

    /// Executes the run without failure logging.
    fn run_inner(&self, config: &RunConfig, now: RunTimestamp) -> Result<RunReport, RunError> {
        validate_control_sets(config)?;
        self.audit.record(&RunAuditEvent::RunStarted {
            run_at: now,
            control_sets: config.control_sets.iter().map(|spec| spec.name.clone()).collect(),
            ledger: config.ledger_path(),
        });

        let mut columns: Vec<Vec<RawScore>> = Vec::with_capacity(config.control_sets.len());
        for spec in &config.control_sets {
            let table = self.source.load(spec).map_err(|source| RunError::Input {
                control_set: spec.name.clone(),
                source,
            })?;
            let values = table.column_values(&config.score_column).ok_or_else(|| {
                RunError::Input {
                    control_set: spec.name.clone(),
                    source: SourceError::MissingScoreColumn {
                        sheet: spec.sheet_name().to_string(),
                        column: config.score_column.clone(),
                    },
                }
            })?;
            columns.push(values);
        }

        let mut control_sets = Vec::with_capacity(columns.len());
        for (spec, values) in config.control_sets.iter().zip(columns) {
            let coerced = coerce_scores(&values);
            let kpi = aggregate(&coerced.scores);
            self.audit.record(&RunAuditEvent::ControlSetAggregated {
                run_at: now,
                control_set: spec.name.clone(),
                kpi,
                dropped: coerced.dropped,
            });
            control_sets.push(ControlSetKpi {
                name: spec.name.clone(),
                label: spec.display_label().to_string(),
                kpi,
                dropped: coerced.dropped,
            });
        }

        let snapshot = HistorySnapshot::from_kpis(
            now,
            control_sets.iter().map(|entry| (&entry.name, &entry.kpi)),
        );
        let ledger = self.ledger.append(&snapshot)?;
        self.audit.record(&RunAuditEvent::LedgerAppended {
            run_at: now,
            requested: ledger.requested.clone(),
            written: ledger.written.clone(),
            fallback: ledger.fallback.clone(),
        });

        Ok(RunReport {
            timestamp: now,
            control_sets,
            snapshot,
            ledger,
        })
    }
}

/// Rejects empty and duplicate control-set lists.
fn validate_control_sets(config: &RunConfig) -> Result<(), RunError> {
    if config.control_sets.is_empty() {
        return Err(RunError::NoControlSets);
    }
    let mut seen = BTreeSet::new();
    for spec in &config.control_sets {
        if !seen.insert(spec.name.as_str()) {
            return Err(RunError::DuplicateControlSet(spec.name.clone()));
        }
    }
    Ok(())
}
