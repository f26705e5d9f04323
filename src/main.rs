//! CLI entry point for the climate statistics tool.
//!
//! Reads one or more tab-delimited observation files and prints a per-state
//! summary to stdout. Diagnostics go to stderr and, optionally, a JSON log file.

use anyhow::Result;
use chrono::{Local, Utc};
use clap::Parser;
use climate_stats::Accumulator;
use climate_stats::driver::{RunSummary, process_paths};
use climate_stats::output::{ReportFormat, write_report};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "climate_stats")]
#[command(about = "Summarize tab-delimited climate observations per state", long_about = None)]
struct Cli {
    /// Observation files to analyze (`.gz` files are decompressed)
    #[arg(value_name = "TDV_FILE", required = true)]
    files: Vec<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Render report timestamps in UTC instead of local time
    #[arg(long, default_value_t = false)]
    utc: bool,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long, env = "LOG_FILE_PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let _file_guard = init_tracing(cli.log_file.as_deref());

    let mut acc = Accumulator::new();
    let run = process_paths(&cli.files, &mut acc);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if cli.utc {
        write_report(&mut out, &acc, cli.format, &Utc)?;
    } else {
        write_report(&mut out, &acc, cli.format, &Local)?;
    }
    out.flush()?;

    Ok(ExitCode::from(exit_status(&run)))
}

/// `0` when every file was processed, `1` when any file failed.
fn exit_status(run: &RunSummary) -> u8 {
    if run.has_failures() {
        warn!(failed = run.failures.len(), "Some files could not be processed");
        return 1;
    }
    0
}

/// Logging setup: colored stderr, plus a JSON rolling log file when a path is given.
///
/// The returned guard must be held until exit so buffered file logs are flushed.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info"));

    let (json_layer, guard) = match log_file {
        Some(path) => {
            let log_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let log_file_name = path
                .file_name()
                .unwrap_or(OsStr::new("climate_stats.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(env_filter("RUST_LOG_JSON", "debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

/// Reads a filter from `var`, falling back to `default` when unset or invalid.
fn env_filter(var: &str, default: &str) -> EnvFilter {
    EnvFilter::try_from_env(var).unwrap_or_else(|_| EnvFilter::new(default))
}
