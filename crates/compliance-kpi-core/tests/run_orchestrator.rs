// crates/compliance-kpi-core/tests/run_orchestrator.rs
// ============================================================================
// Module: Run Orchestrator Tests
// Description: Tests for run sequencing, input failures, and ledger fallback.
// ============================================================================
//! ## Overview
//! Drives the orchestrator against in-memory collaborators to check that
//! input failures never reach the ledger and that a blocked ledger still
//! yields exactly one recorded row.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::path::PathBuf;

use compliance_kpi_core::AuditLevel;
use compliance_kpi_core::ControlSetName;
use compliance_kpi_core::ControlSetSpec;
use compliance_kpi_core::ControlTable;
use compliance_kpi_core::FallbackReason;
use compliance_kpi_core::InMemoryControlSource;
use compliance_kpi_core::InMemoryHistoryLedger;
use compliance_kpi_core::InMemoryRunAuditSink;
use compliance_kpi_core::RawScore;
use compliance_kpi_core::RunAuditEvent;
use compliance_kpi_core::RunConfig;
use compliance_kpi_core::RunError;
use compliance_kpi_core::RunOrchestrator;
use compliance_kpi_core::RunTimestamp;
use compliance_kpi_core::SourceError;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const SCORE_COLUMN: &str = "Compliance Score (%)";

fn config(names: &[&str]) -> RunConfig {
    RunConfig {
        input_file: PathBuf::from("controls"),
        score_column: SCORE_COLUMN.to_string(),
        output_folder: PathBuf::from("out"),
        ledger_name: "summary_history.csv".to_string(),
        control_sets: names
            .iter()
            .map(|name| ControlSetSpec::new(ControlSetName::new(*name).unwrap()))
            .collect(),
    }
}

fn table(scores: Vec<RawScore>) -> ControlTable {
    ControlTable::from_scores(SCORE_COLUMN, scores)
}

fn two_set_source() -> InMemoryControlSource {
    InMemoryControlSource::new()
        .with_table(
            "27001",
            table(vec![RawScore::from(80), RawScore::from(92), RawScore::from(65)]),
        )
        .with_table("27701", table(vec![RawScore::from(95), RawScore::from("N/A")]))
}

fn at(seconds: i64) -> RunTimestamp {
    RunTimestamp::from_unix_seconds(seconds).unwrap()
}

// ============================================================================
// SECTION: Successful Runs
// ============================================================================

#[test]
fn run_aggregates_every_control_set_and_appends_one_row() {
    let ledger = InMemoryHistoryLedger::new(PathBuf::from("out/summary_history.csv"));
    let audit = InMemoryRunAuditSink::new();
    let orchestrator = RunOrchestrator::new(two_set_source(), ledger.clone(), audit.clone());

    let report = orchestrator.run(&config(&["27001", "27701"]), at(1_760_000_000)).unwrap();

    let iso = report.kpi("27001").unwrap();
    assert_eq!((iso.total, iso.green, iso.amber, iso.red), (3, 1, 1, 1));
    assert!((iso.readiness - 79.0).abs() < f64::EPSILON);
    let privacy = report.kpi("27701").unwrap();
    assert_eq!(privacy.total, 1);
    assert_eq!(report.control_sets[1].dropped, 1);

    let rows = ledger.snapshots();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], report.snapshot);
    assert_eq!(
        rows[0].header_line(),
        "timestamp,27001_total,27001_readiness,27701_total,27701_readiness"
    );
    assert_eq!(rows[0].to_row().unwrap(), "2025-10-09_08-53-20,3,79.0,1,95.0");
    assert!(!report.ledger.is_fallback());
    assert_eq!(report.ledger_path(), PathBuf::from("out/summary_history.csv").as_path());

    let events = audit.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], RunAuditEvent::RunStarted { .. }));
    assert!(matches!(events[3], RunAuditEvent::LedgerAppended { fallback: None, .. }));
}

#[test]
fn control_set_with_no_valid_scores_is_still_recorded() {
    let source = InMemoryControlSource::new()
        .with_table("27001", table(vec![RawScore::Empty, RawScore::from("tbd")]));
    let ledger = InMemoryHistoryLedger::default();
    let orchestrator = RunOrchestrator::new(source, ledger.clone(), InMemoryRunAuditSink::new());

    let report = orchestrator.run(&config(&["27001"]), at(0)).unwrap();

    assert_eq!(report.kpi("27001").unwrap().total, 0);
    assert_eq!(ledger.snapshots()[0].to_row().unwrap(), "1970-01-01_00-00-00,0,0.0");
}

#[test]
fn repeated_runs_append_distinct_rows() {
    let ledger = InMemoryHistoryLedger::default();
    let orchestrator =
        RunOrchestrator::new(two_set_source(), ledger.clone(), InMemoryRunAuditSink::new());
    let cfg = config(&["27001", "27701"]);

    orchestrator.run(&cfg, at(100)).unwrap();
    orchestrator.run(&cfg, at(100)).unwrap();

    let rows = ledger.snapshots();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], rows[1]);
}

#[test]
fn kpis_by_name_is_keyed_by_control_set() {
    let orchestrator = RunOrchestrator::new(
        two_set_source(),
        InMemoryHistoryLedger::default(),
        InMemoryRunAuditSink::new(),
    );
    let report = orchestrator.run(&config(&["27701", "27001"]), at(5)).unwrap();
    let names: Vec<_> = report.kpis_by_name().into_keys().map(String::from).collect();
    assert_eq!(names, vec!["27001".to_string(), "27701".to_string()]);
    assert_eq!(report.snapshot.control_sets()[0].as_str(), "27701");
}

// ============================================================================
// SECTION: Input Failures
// ============================================================================

#[test]
fn missing_input_aborts_before_ledger_write() {
    let source = two_set_source()
        .with_error("27701", SourceError::NotFound("controls/27701.csv".to_string()));
    let ledger = InMemoryHistoryLedger::default();
    let audit = InMemoryRunAuditSink::new();
    let orchestrator = RunOrchestrator::new(source, ledger.clone(), audit.clone());

    let err = orchestrator.run(&config(&["27001", "27701"]), at(1)).unwrap_err();

    match err {
        RunError::Input {
            control_set,
            source: SourceError::NotFound(_),
        } => assert_eq!(control_set.as_str(), "27701"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(ledger.snapshots().is_empty());
    assert!(ledger.fallback_snapshots().is_empty());
    let events = audit.events();
    let last = events.last().unwrap();
    assert_eq!(last.level(), AuditLevel::Error);
    assert!(!events.iter().any(|event| matches!(event, RunAuditEvent::ControlSetAggregated { .. })));
}

#[test]
fn unknown_control_set_is_not_found() {
    let ledger = InMemoryHistoryLedger::default();
    let orchestrator =
        RunOrchestrator::new(two_set_source(), ledger.clone(), InMemoryRunAuditSink::new());
    let err = orchestrator.run(&config(&["27001", "9001"]), at(1)).unwrap_err();
    assert!(matches!(
        err,
        RunError::Input {
            source: SourceError::NotFound(_),
            ..
        }
    ));
    assert!(ledger.snapshots().is_empty());
}

#[test]
fn missing_score_column_is_an_input_error() {
    let source = InMemoryControlSource::new()
        .with_table("27001", ControlTable::from_scores("Score", vec![RawScore::from(90)]));
    let ledger = InMemoryHistoryLedger::default();
    let orchestrator = RunOrchestrator::new(source, ledger.clone(), InMemoryRunAuditSink::new());

    let err = orchestrator.run(&config(&["27001"]), at(1)).unwrap_err();

    assert!(matches!(
        err,
        RunError::Input {
            source: SourceError::MissingScoreColumn { .. },
            ..
        }
    ));
    assert!(ledger.snapshots().is_empty());
}

#[test]
fn empty_and_duplicate_control_sets_are_rejected() {
    let orchestrator = RunOrchestrator::new(
        two_set_source(),
        InMemoryHistoryLedger::default(),
        InMemoryRunAuditSink::new(),
    );
    assert_eq!(orchestrator.run(&config(&[]), at(1)).unwrap_err(), RunError::NoControlSets);
    assert!(matches!(
        orchestrator.run(&config(&["27001", "27001"]), at(1)).unwrap_err(),
        RunError::DuplicateControlSet(_)
    ));
}

// ============================================================================
// SECTION: Ledger Fallback
// ============================================================================

#[test]
fn blocked_ledger_diverts_to_fallback_and_run_succeeds() {
    let primary = PathBuf::from("out/summary_history.csv");
    let ledger = InMemoryHistoryLedger::new(primary.clone());
    ledger.set_blocked(true);
    let audit = InMemoryRunAuditSink::new();
    let orchestrator = RunOrchestrator::new(two_set_source(), ledger.clone(), audit.clone());

    let report = orchestrator.run(&config(&["27001", "27701"]), at(1_760_000_000)).unwrap();

    assert!(report.ledger.is_fallback());
    assert!(matches!(report.ledger.fallback, Some(FallbackReason::Blocked { .. })));
    assert_ne!(report.ledger.written, primary);
    assert_eq!(
        report.ledger.written,
        PathBuf::from("out/summary_history_20251009_085320.csv")
    );
    assert!(ledger.snapshots().is_empty());
    assert_eq!(ledger.fallback_snapshots().len(), 1);
    assert_eq!(audit.events().last().unwrap().level(), AuditLevel::Warn);
}

#[test]
fn fallback_names_stay_unique_within_one_second() {
    let ledger = InMemoryHistoryLedger::new(PathBuf::from("out/summary_history.csv"));
    ledger.set_blocked(true);
    let orchestrator =
        RunOrchestrator::new(two_set_source(), ledger.clone(), InMemoryRunAuditSink::new());
    let cfg = config(&["27001"]);

    let first = orchestrator.run(&cfg, at(0)).unwrap();
    let second = orchestrator.run(&cfg, at(0)).unwrap();

    assert_ne!(first.ledger.written, second.ledger.written);
    assert_eq!(
        second.ledger.written,
        PathBuf::from("out/summary_history_19700101_000000_1.csv")
    );
}
