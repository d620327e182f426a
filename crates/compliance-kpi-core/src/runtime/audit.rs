// crates/compliance-kpi-core/src/runtime/audit.rs
// ============================================================================
// Module: Run Audit Logging
// Description: Structured run events and their sinks.
// Purpose: Emit JSON-line run logs without hard logging dependencies.
// Dependencies: crate::core, crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! Every orchestrated run emits a small sequence of events: start, one per
//! aggregated control set, the ledger outcome, or a failure. Sinks serialize
//! each event as one JSON line carrying `level` and `timestamp_ms`, so
//! deployments can route them to any log pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ControlSetName;
use crate::core::KpiRecord;
use crate::core::RunTimestamp;
use crate::interfaces::FallbackReason;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity attached to each audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    /// Normal progress.
    Info,
    /// Degraded but recovered (ledger fallback).
    Warn,
    /// Run failed.
    Error,
}

/// Run audit event payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunAuditEvent {
    /// Run accepted its configuration.
    RunStarted {
        /// Run time.
        run_at: RunTimestamp,
        /// Control sets in ledger column order.
        control_sets: Vec<ControlSetName>,
        /// Primary ledger path.
        ledger: PathBuf,
    },
    /// One control set was aggregated.
    ControlSetAggregated {
        /// Run time.
        run_at: RunTimestamp,
        /// Control set name.
        control_set: ControlSetName,
        /// Computed KPIs.
        kpi: KpiRecord,
        /// Score cells dropped during coercion.
        dropped: usize,
    },
    /// Snapshot reached the ledger.
    LedgerAppended {
        /// Run time.
        run_at: RunTimestamp,
        /// Path the run asked for.
        requested: PathBuf,
        /// Path that received the row.
        written: PathBuf,
        /// Present when the row went to a fallback file.
        fallback: Option<FallbackReason>,
    },
    /// Run aborted.
    RunFailed {
        /// Run time.
        run_at: RunTimestamp,
        /// Control set whose input failed, if any.
        control_set: Option<ControlSetName>,
        /// Failure message.
        error: String,
    },
}

impl RunAuditEvent {
    /// Returns the severity of this event.
    #[must_use]
    pub const fn level(&self) -> AuditLevel {
        match self {
            Self::RunStarted {
                ..
            }
            | Self::ControlSetAggregated {
                ..
            } => AuditLevel::Info,
            Self::LedgerAppended {
                fallback, ..
            } => {
                if fallback.is_some() {
                    AuditLevel::Warn
                } else {
                    AuditLevel::Info
                }
            }
            Self::RunFailed {
                ..
            } => AuditLevel::Error,
        }
    }
}

/// Serialized audit line: level and wall-clock time around the event body.
#[derive(Serialize)]
struct AuditLine<'a> {
    /// Event severity.
    level: AuditLevel,
    /// Emission time (milliseconds since epoch).
    timestamp_ms: u128,
    /// Event body.
    #[serde(flatten)]
    event: &'a RunAuditEvent,
}

/// Renders an event as a single JSON line (without newline).
fn render_line(event: &RunAuditEvent) -> Option<String> {
    let timestamp_ms =
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    serde_json::to_string(&AuditLine {
        level: event.level(),
        timestamp_ms,
        event,
    })
    .ok()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for run events.
pub trait RunAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &RunAuditEvent);
}

impl<T: RunAuditSink + ?Sized> RunAuditSink for Box<T> {
    fn record(&self, event: &RunAuditEvent) {
        (**self).record(event);
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrRunAuditSink;

impl RunAuditSink for StderrRunAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Some(line) = render_line(event) {
            let _ = writeln!(std::io::stderr(), "{line}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileRunAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileRunAuditSink {
    /// Opens the audit log file in append mode, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RunAuditSink for FileRunAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Some(line) = render_line(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{line}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopRunAuditSink;

impl RunAuditSink for NoopRunAuditSink {
    fn record(&self, _event: &RunAuditEvent) {}
}

/// Audit sink that keeps events in memory for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunAuditSink {
    /// Recorded events in emission order.
    events: Arc<Mutex<Vec<RunAuditEvent>>>,
}

impl InMemoryRunAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RunAuditEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl RunAuditSink for InMemoryRunAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
