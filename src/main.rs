//! tablediff - Streaming merge diff for key-sorted tabular data

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use termcolor::{ColorChoice, StandardStream};

use tablediff::config::{Config, OutputFormat};
use tablediff::diff::{AutoPlan, DiffEngine, DiffKind, TimeSpan};
use tablediff::model::ColumnType;
use tablediff::sink::{JsonSink, ReportOptions, ReportSink, Sink};
use tablediff::source::{CsvOptions, CsvSource, Source};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Report,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Report => OutputFormat::Report,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliKind {
    Row,
    Column,
    Both,
}

impl From<CliKind> for DiffKind {
    fn from(k: CliKind) -> Self {
        match k {
            CliKind::Row => DiffKind::RowDiff,
            CliKind::Column => DiffKind::ColumnDiff,
            CliKind::Both => DiffKind::Both,
        }
    }
}

/// Diff two CSV files that are sorted by the same key
#[derive(Parser, Debug)]
#[command(name = "tablediff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Left-hand (original) file
    lhs_file: PathBuf,

    /// Right-hand (new) file
    rhs_file: PathBuf,

    /// Column(s) both files are sorted by (comma-separated); row number if omitted
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,

    /// Which differences to report
    #[arg(long, value_enum, default_value = "both")]
    kind: CliKind,

    /// Output format
    #[arg(short, long, value_enum, default_value = "report")]
    format: CliOutputFormat,

    /// Stop after this many differences
    #[arg(long)]
    max_diffs: Option<u64>,

    /// Only compare these columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    diff_column: Vec<String>,

    /// Column(s) to ignore in comparison (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore_column: Vec<String>,

    /// Column(s) to show with each difference (comma-separated)
    #[arg(long, value_delimiter = ',')]
    display_column: Vec<String>,

    /// Numeric tolerance as COLUMN=VALUE (repeatable)
    #[arg(long, value_parser = parse_assignment::<f64>)]
    tolerance: Vec<(String, f64)>,

    /// Date/time tolerance as COLUMN=SPAN, e.g. updated=5m (repeatable)
    #[arg(long, value_parser = parse_assignment::<TimeSpan>)]
    time_tolerance: Vec<(String, TimeSpan)>,

    /// Declared column type as COLUMN=TYPE (repeatable)
    #[arg(long = "type", value_parser = parse_assignment::<ColumnType>)]
    column_type: Vec<(String, ColumnType)>,

    /// Ignore whitespace layout in text columns
    #[arg(long)]
    normalize_text: bool,

    /// Leave timestamps out of the report
    #[arg(long)]
    stable_output: bool,

    /// Only show the summary, not each difference
    #[arg(long)]
    summary: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_assignment<T>(s: &str) -> std::result::Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got {}", s))?;
    let value = value.parse::<T>().map_err(|e| e.to_string())?;
    Ok((name.trim().to_string(), value))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(has_changes) => {
            if has_changes {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS // No differences
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn config_from(cli: Cli) -> Config {
    let mut config = Config::new(cli.lhs_file, cli.rhs_file)
        .with_key_columns(cli.key)
        .with_kind(cli.kind.into())
        .with_output_format(cli.format.into())
        .with_diff_columns(cli.diff_column)
        .with_ignore_columns(cli.ignore_column)
        .with_display_columns(cli.display_column)
        .with_normalize_text(cli.normalize_text)
        .with_stable_output(cli.stable_output)
        .with_summary_only(cli.summary);
    if let Some(max_diffs) = cli.max_diffs {
        config = config.with_max_diffs(max_diffs);
    }
    for (column, tolerance) in cli.tolerance {
        config = config.with_numeric_tolerance(column, tolerance);
    }
    for (column, span) in cli.time_tolerance {
        config = config.with_temporal_tolerance(column, span);
    }
    for (column, column_type) in cli.column_type {
        config = config.with_column_type(column, column_type);
    }
    config
}

fn run(cli: Cli) -> Result<bool> {
    let config = config_from(cli);

    let csv_options = CsvOptions {
        key_columns: config.key_columns.clone(),
        column_types: config.column_types.clone(),
        ..Default::default()
    };
    let mut lhs = CsvSource::new(&config.lhs_file, &csv_options)
        .with_context(|| format!("Failed to read lhs file: {}", config.lhs_file.display()))?;
    let mut rhs = CsvSource::new(&config.rhs_file, &csv_options)
        .with_context(|| format!("Failed to read rhs file: {}", config.rhs_file.display()))?;

    let plan = AutoPlan::from(&config)
        .build(lhs.model().copy(), rhs.model().copy())
        .context("Failed to build comparison plan")?;

    let mut sink: Box<dyn Sink> = match config.output_format {
        OutputFormat::Report => Box::new(ReportSink::new(
            StandardStream::stdout(ColorChoice::Auto),
            ReportOptions {
                stable_output: config.stable_output,
                summary_only: config.summary_only,
            },
        )),
        OutputFormat::Json => Box::new(JsonSink::new(std::io::stdout().lock())),
    };

    let run = DiffEngine::new()
        .diff(&mut lhs, &mut rhs, sink.as_mut(), Arc::new(plan))
        .context("Diff run failed")?;

    Ok(run.diff_count() > 0)
}
