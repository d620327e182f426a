// crates/compliance-kpi-core/src/runtime/store.rs
// ============================================================================
// Module: Compliance KPI In-Memory Collaborators
// Description: In-memory control source and history ledger.
// Purpose: Provide deterministic collaborators for tests and demos.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`ControlSource`] and
//! [`HistoryLedger`] for tests and local demos. The ledger can be switched
//! into a blocked state to exercise the fallback contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::core::ControlSetSpec;
use crate::core::ControlTable;
use crate::core::DEFAULT_LEDGER_NAME;
use crate::core::HistorySnapshot;
use crate::interfaces::ControlSource;
use crate::interfaces::FallbackReason;
use crate::interfaces::HistoryLedger;
use crate::interfaces::LedgerError;
use crate::interfaces::LedgerReceipt;
use crate::interfaces::SourceError;
use crate::interfaces::fallback_path_for;

// ============================================================================
// SECTION: In-Memory Control Source
// ============================================================================

/// In-memory control source keyed by control-set name.
#[derive(Debug, Default, Clone)]
pub struct InMemoryControlSource {
    /// Tables (or injected failures) per control set.
    tables: BTreeMap<String, Result<ControlTable, SourceError>>,
}

impl InMemoryControlSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the table returned for a control set.
    #[must_use]
    pub fn with_table(mut self, control_set: &str, table: ControlTable) -> Self {
        self.tables.insert(control_set.to_string(), Ok(table));
        self
    }

    /// Registers a failure returned for a control set.
    #[must_use]
    pub fn with_error(mut self, control_set: &str, error: SourceError) -> Self {
        self.tables.insert(control_set.to_string(), Err(error));
        self
    }
}

impl ControlSource for InMemoryControlSource {
    fn load(&self, control_set: &ControlSetSpec) -> Result<ControlTable, SourceError> {
        self.tables
            .get(control_set.name.as_str())
            .cloned()
            .unwrap_or_else(|| Err(SourceError::NotFound(control_set.name.to_string())))
    }
}

// ============================================================================
// SECTION: In-Memory History Ledger
// ============================================================================

/// In-memory history ledger with a switchable blocked state.
#[derive(Debug, Clone)]
pub struct InMemoryHistoryLedger {
    /// Nominal primary path reported in receipts.
    path: PathBuf,
    /// Rows accepted by the primary ledger.
    primary: Arc<Mutex<Vec<HistorySnapshot>>>,
    /// Rows diverted to fallback files, keyed by fallback path.
    fallbacks: Arc<Mutex<Vec<(PathBuf, HistorySnapshot)>>>,
    /// When set, the primary ledger refuses writes.
    blocked: Arc<AtomicBool>,
}

impl Default for InMemoryHistoryLedger {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_LEDGER_NAME))
    }
}

impl InMemoryHistoryLedger {
    /// Creates an empty ledger reporting `path` as its primary location.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            primary: Arc::new(Mutex::new(Vec::new())),
            fallbacks: Arc::new(Mutex::new(Vec::new())),
            blocked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Blocks or unblocks the primary ledger.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Returns the rows held by the primary ledger.
    #[must_use]
    pub fn snapshots(&self) -> Vec<HistorySnapshot> {
        self.primary.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns the rows diverted to fallback files.
    #[must_use]
    pub fn fallback_snapshots(&self) -> Vec<(PathBuf, HistorySnapshot)> {
        self.fallbacks.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl HistoryLedger for InMemoryHistoryLedger {
    fn append(&self, snapshot: &HistorySnapshot) -> Result<LedgerReceipt, LedgerError> {
        if !self.blocked.load(Ordering::SeqCst) {
            self.primary
                .lock()
                .map_err(|_| LedgerError::Io("ledger mutex poisoned".to_string()))?
                .push(snapshot.clone());
            return Ok(LedgerReceipt::primary(self.path.clone()));
        }
        let mut guard = self
            .fallbacks
            .lock()
            .map_err(|_| LedgerError::Io("fallback mutex poisoned".to_string()))?;
        let mut attempt = 0_u32;
        let written = loop {
            let candidate = fallback_path_for(&self.path, snapshot.timestamp, attempt)?;
            if guard.iter().all(|(path, _)| *path != candidate) {
                break candidate;
            }
            attempt += 1;
        };
        guard.push((written.clone(), snapshot.clone()));
        drop(guard);
        Ok(LedgerReceipt {
            requested: self.path.clone(),
            written,
            fallback: Some(FallbackReason::Blocked {
                error: "primary ledger blocked".to_string(),
            }),
        })
    }
}
