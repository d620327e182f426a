// crates/compliance-kpi-cli/src/main.rs
// ============================================================================
// Module: Compliance KPI CLI Entry Point
// Description: Command dispatcher for KPI runs, history review, and config checks.
// Purpose: Provide a predictable CLI over the aggregation pipeline.
// Dependencies: clap, compliance-kpi-core, compliance-kpi-store,
//               compliance-kpi-config, serde, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! The compliance-kpi CLI loads the run configuration, aggregates every
//! configured control set into a KPI record, and appends the run to the CSV
//! history ledger. It can also print the recorded history with the latest
//! readiness changes and validate a configuration file without running.
//! All user-facing strings are routed through the message catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use compliance_kpi_cli::t;
use compliance_kpi_config::ComplianceKpiConfig;
use compliance_kpi_core::ControlSetKpi;
use compliance_kpi_core::FallbackReason;
use compliance_kpi_core::FileRunAuditSink;
use compliance_kpi_core::LedgerReceipt;
use compliance_kpi_core::NoopRunAuditSink;
use compliance_kpi_core::RunAuditSink;
use compliance_kpi_core::RunOrchestrator;
use compliance_kpi_core::RunReport;
use compliance_kpi_core::RunTimestamp;
use compliance_kpi_core::StderrRunAuditSink;
use compliance_kpi_core::header_line_for;
use compliance_kpi_store::CombinedHistory;
use compliance_kpi_store::CsvWorkbookSource;
use compliance_kpi_store::FileHistoryLedger;
use compliance_kpi_store::ReadinessDelta;
use compliance_kpi_store::read_history;
use compliance_kpi_store::read_history_with_fallbacks;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "compliance-kpi", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Suppress run event logging.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate every configured control set and append the run to history.
    Run(RunCommand),
    /// Recorded history utilities.
    History {
        /// Selected history subcommand.
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Output formats for run and history commands.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Pretty-printed JSON output.
    Json,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output format for the run summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Stamp the run with this UTC time instead of the current time.
    #[arg(long, value_name = "UNIX_SECONDS")]
    at: Option<i64>,
}

/// History subcommands.
#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Print recorded runs and the latest readiness changes.
    Show(HistoryShowCommand),
}

/// Arguments for `history show`.
#[derive(Args, Debug)]
struct HistoryShowCommand {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Read this ledger file instead of the configured one.
    #[arg(long, value_name = "PATH")]
    ledger: Option<PathBuf>,
    /// Merge fallback files written next to the ledger.
    #[arg(long, action = ArgAction::SetTrue)]
    include_fallbacks: bool,
    /// Output format for the history listing.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file without running.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to the configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a rendered message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Rendered error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(&command, cli.quiet),
        Commands::History {
            command,
        } => command_history(command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Loads and validates the configuration.
fn load_config(path: Option<&Path>) -> CliResult<ComplianceKpiConfig> {
    ComplianceKpiConfig::load(path)
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes one aggregation run.
fn command_run(command: &RunCommand, quiet: bool) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let run_config =
        config.run_config().map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let now = resolve_run_time(command.at)?;
    let audit = audit_sink(config.log_path().as_deref(), quiet)?;
    let ledger = FileHistoryLedger::new(run_config.ledger_path())
        .map_err(|err| CliError::new(t!("run.ledger_open_failed", error = err)))?;
    let source = CsvWorkbookSource::new(run_config.input_file.clone());
    let orchestrator = RunOrchestrator::new(source, ledger, audit);

    let report = orchestrator
        .run(&run_config, now)
        .map_err(|err| CliError::new(t!("run.failed", error = err)))?;

    if let Some(warning) = fallback_warning(&report.ledger) {
        write_stderr_line(&warning).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    match command.format {
        OutputFormat::Text => write_stdout_line(&render_run_text(&report))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
        OutputFormat::Json => write_json(&report)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolves the run timestamp from `--at` or the clock.
fn resolve_run_time(at: Option<i64>) -> CliResult<RunTimestamp> {
    match at {
        None => Ok(RunTimestamp::now()),
        Some(seconds) => RunTimestamp::from_unix_seconds(seconds)
            .map_err(|err| CliError::new(t!("run.at_invalid", value = seconds, error = err))),
    }
}

/// Selects the run event sink.
fn audit_sink(log_path: Option<&Path>, quiet: bool) -> CliResult<Box<dyn RunAuditSink>> {
    if quiet {
        return Ok(Box::new(NoopRunAuditSink));
    }
    match log_path {
        Some(path) => {
            let sink = FileRunAuditSink::new(path).map_err(|err| {
                CliError::new(t!("run.audit_open_failed", path = path.display(), error = err))
            })?;
            Ok(Box::new(sink))
        }
        None => Ok(Box::new(StderrRunAuditSink)),
    }
}

/// Renders the run summary as text.
fn render_run_text(report: &RunReport) -> String {
    let mut lines = vec![t!("run.header", timestamp = report.timestamp)];
    for control_set in &report.control_sets {
        lines.push(render_kpi_line(control_set));
        if control_set.dropped > 0 {
            lines.push(t!("run.dropped", count = control_set.dropped));
        }
    }
    lines.push(t!("run.ledger_written", path = report.ledger.written.display()));
    lines.join("\n")
}

/// Renders one control set's KPI record.
fn render_kpi_line(control_set: &ControlSetKpi) -> String {
    let kpi = &control_set.kpi;
    t!(
        "run.kpi_line",
        label = control_set.label,
        total = kpi.total,
        green = kpi.green,
        amber = kpi.amber,
        red = kpi.red,
        readiness = format!("{:.1}", kpi.readiness)
    )
}

/// Returns a warning when the snapshot went to a fallback file.
fn fallback_warning(receipt: &LedgerReceipt) -> Option<String> {
    let path = receipt.requested.display();
    let written = receipt.written.display();
    let warning = match receipt.fallback.as_ref()? {
        FallbackReason::Blocked {
            error,
        } => t!("run.fallback.blocked", path = path, error = error, written = written),
        FallbackReason::SchemaMismatch {
            existing,
        } => t!("run.fallback.schema_mismatch", path = path, existing = existing, written = written),
        FallbackReason::OutOfOrder {
            last,
        } => t!("run.fallback.out_of_order", path = path, last = last, written = written),
    };
    Some(warning)
}

// ============================================================================
// SECTION: History Command
// ============================================================================

/// Dispatches history subcommands.
fn command_history(command: HistoryCommand) -> CliResult<ExitCode> {
    match command {
        HistoryCommand::Show(command) => command_history_show(&command),
    }
}

/// JSON view of a history listing.
#[derive(Debug, Serialize)]
struct HistoryView<'a> {
    /// Merged ledger contents.
    #[serde(flatten)]
    combined: &'a CombinedHistory,
    /// Latest readiness change per control set.
    deltas: Vec<ReadinessDelta>,
}

/// Executes `history show`.
fn command_history_show(command: &HistoryShowCommand) -> CliResult<ExitCode> {
    let ledger_path = match &command.ledger {
        Some(path) => path.clone(),
        None => load_config(command.config.as_deref())?.ledger_path(),
    };
    let combined = load_history(&ledger_path, command.include_fallbacks)?;
    match command.format {
        OutputFormat::Text => write_stdout_line(&render_history_text(&ledger_path, &combined))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
        OutputFormat::Json => write_json(&HistoryView {
            combined: &combined,
            deltas: combined.history.latest_deltas(),
        })?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Reads the ledger, optionally merged with its fallback files.
fn load_history(ledger_path: &Path, include_fallbacks: bool) -> CliResult<CombinedHistory> {
    let result = if include_fallbacks {
        read_history_with_fallbacks(ledger_path)
    } else {
        read_history(ledger_path).map(|history| {
            let sources = if history.control_sets.is_empty() {
                Vec::new()
            } else {
                vec![ledger_path.to_path_buf()]
            };
            CombinedHistory {
                history,
                sources,
                skipped: Vec::new(),
            }
        })
    };
    result.map_err(|err| CliError::new(t!("history.read_failed", error = err)))
}

/// Renders the history listing as text.
fn render_history_text(ledger_path: &Path, combined: &CombinedHistory) -> String {
    let history = &combined.history;
    let mut lines = Vec::new();
    if history.is_empty() {
        lines.push(t!("history.empty", path = ledger_path.display()));
    } else {
        lines.push(header_line_for(&history.control_sets));
        for row in &history.rows {
            lines.push(row.to_row().unwrap_or_else(|_| row.timestamp.unix_seconds().to_string()));
        }
    }
    if combined.sources.len() > 1 {
        lines.push(t!("history.sources", count = combined.sources.len()));
    }
    for skipped in &combined.skipped {
        lines.push(t!("history.skipped", path = skipped.display()));
    }
    let deltas = history.latest_deltas();
    if !deltas.is_empty() {
        lines.push(t!("history.deltas"));
        lines.extend(deltas.iter().map(render_delta_line));
    }
    lines.join("\n")
}

/// Renders one readiness change.
fn render_delta_line(delta: &ReadinessDelta) -> String {
    t!(
        "history.delta",
        control_set = delta.control_set,
        previous = format!("{:.1}", delta.previous),
        current = format!("{:.1}", delta.current),
        delta = format!("{:+.1}", delta.delta)
    )
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let names: Vec<&str> = config.control_sets.iter().map(|set| set.name.as_str()).collect();
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&t!(
        "config.validate.summary",
        control_sets = names.join(", "),
        ledger = config.ledger_path().display()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a pretty-printed JSON value to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
