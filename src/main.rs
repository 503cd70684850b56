//! `LogSift` - Log analysis with anomaly detection
//!
//! Copyright (C) 2025 Daniel Freiermuth
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use logsift::anomaly::{create_default_scorer, Detection};
use logsift::core::export::{default_export_name, write_export, ExportFormat};
use logsift::core::{LogFilter, LogTable};
use logsift::insights::{anomaly_summary, AnomalySummary};
use logsift::parser::record::normalize_severity;
use logsift::parser::{parse_content, parsing_stats, ParseStats};
use logsift::store::{new_session_id, SessionRecord, SessionStore, ERROR_SEVERITIES};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(author = "Daniel Freiermuth")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Analyze log files with anomaly detection and pattern matching", long_about = None)]
struct Cli {
    /// Path to the session database (defaults to the user data directory)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a log file, flag anomalous entries and print a report
    Analyze(AnalyzeArgs),
    /// List recent analysis sessions
    History {
        /// Show at most this many sessions
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Show totals across everything stored so far
    Stats,
    /// Delete stored data older than the given age, then compact the database
    Cleanup {
        /// Age threshold in days
        #[arg(long, default_value_t = 30, value_name = "DAYS")]
        days: u32,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Path to the log file to analyze
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Label recorded as the processing engine of this session
    #[arg(long, default_value = "standard", value_name = "NAME")]
    engine: String,

    /// Keep only these severities before detection (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "SEVERITY")]
    severity: Vec<String>,

    /// Keep records dated on or after this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    since: Option<NaiveDate>,

    /// Keep records dated on or before this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    until: Option<NaiveDate>,

    /// Keep records whose message contains this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    contains: Option<String>,

    /// Also write the parsed table to a file in this format
    #[arg(long, value_enum, value_name = "FORMAT")]
    export: Option<ExportKind>,

    /// Export file path (defaults to a timestamped name)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report style on stdout
    #[arg(long, value_enum, default_value = "text")]
    format: ReportStyle,

    /// Skip writing this run to the session database
    #[arg(long)]
    no_store: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportKind {
    Csv,
    Json,
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Csv => Self::Csv,
            ExportKind::Json => Self::Json,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportStyle {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so reports on stdout stay pipeable.
    // Set RUST_LOG to override (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("LogSift starting up (version {LONG_VERSION})");

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => analyze(cli.db, args),
        Command::History { limit } => history(&open_store(cli.db)?, limit),
        Command::Stats => stats(&open_store(cli.db)?),
        Command::Cleanup { days } => cleanup(&open_store(cli.db)?, days),
    }
}

fn analyze(db_override: Option<PathBuf>, args: AnalyzeArgs) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let table = parse_content(&content);
    let stats = parsing_stats(&table);
    let filename = display_name(&args.file);

    let filter = build_filter(&args);
    let selected = if filter.is_empty() {
        None
    } else {
        Some(filter.matching_indices(&table))
    };
    if let Some(indices) = &selected {
        tracing::info!("filters kept {} of {} records", indices.len(), table.len());
    }

    let filtered = selected.as_ref().map(|indices| table.select(indices));
    let view = filtered.as_ref().unwrap_or(&table);

    let mut detection = create_default_scorer().detect(view);
    let summary = anomaly_summary(view, &detection.indices);
    let analyzed = view.len();

    // From here on anomaly coordinates refer to the full table.
    if let Some(positions) = &selected {
        detection = remap_detection(&detection, positions, table.len());
    }

    let session_id = if args.no_store || table.is_empty() {
        None
    } else {
        let store = open_store(db_override)?;
        Some(persist(
            &store, &filename, &args.engine, &table, &detection, &stats, &summary,
        )?)
    };

    if let Some(kind) = args.export {
        let format = ExportFormat::from(kind);
        let path = args
            .output
            .unwrap_or_else(|| PathBuf::from(default_export_name(format)));
        write_export(&table, format, &path)?;
        tracing::info!("exported {} records to {}", table.len(), path.display());
    }

    let report = AnalysisReport {
        filename: &filename,
        analyzed_records: analyzed,
        parse_stats: &stats,
        anomaly_summary: &summary,
        anomalies: flagged_lines(&table, &detection),
        session_id: session_id.as_deref(),
    };
    match args.format {
        ReportStyle::Text => print_text_report(&report),
        ReportStyle::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn history(store: &SessionStore, limit: Option<usize>) -> anyhow::Result<()> {
    let sessions = store.recent_sessions(limit)?;
    if sessions.is_empty() {
        println!("No analysis sessions stored yet.");
        return Ok(());
    }
    for session in &sessions {
        let created = session.created_at.as_deref().unwrap_or("-");
        let short_id = session.session_id.get(..8).unwrap_or(&session.session_id);
        println!(
            "{created}  {short_id}  {:<24} {:>7} logs {:>5} errors {:>5} anomalies  [{}]",
            session.filename,
            session.total_logs,
            session.error_count,
            session.anomaly_count,
            session.processing_engine
        );
    }
    Ok(())
}

fn stats(store: &SessionStore) -> anyhow::Result<()> {
    let totals = store.dashboard_stats()?;
    println!("Sessions analyzed: {}", totals.total_sessions);
    println!("Logs stored:       {}", totals.total_logs);
    println!("Anomalies stored:  {}", totals.total_anomalies);
    println!("Logs last 24 h:    {}", totals.logs_last_day);
    Ok(())
}

fn cleanup(store: &SessionStore, days: u32) -> anyhow::Result<()> {
    let report = store.cleanup_older_than(days)?;
    println!(
        "Removed {} logs, {} anomalies and {} sessions older than {days} days.",
        report.logs_deleted, report.anomalies_deleted, report.sessions_deleted
    );
    Ok(())
}

fn open_store(db_override: Option<PathBuf>) -> anyhow::Result<SessionStore> {
    let path = match db_override {
        Some(path) => path,
        None => {
            let base = dirs::data_dir().context("could not determine the user data directory")?;
            let dir = base.join("logsift");
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            dir.join("sessions.db")
        }
    };
    tracing::debug!("opening session store at {}", path.display());
    Ok(SessionStore::open_at(&path)?)
}

fn build_filter(args: &AnalyzeArgs) -> LogFilter {
    let severities = if args.severity.is_empty() {
        None
    } else {
        Some(args.severity.iter().map(|s| normalize_severity(s)).collect())
    };
    LogFilter {
        severities,
        start_date: args.since,
        end_date: args.until,
        message_contains: args.contains.clone(),
    }
}

fn persist(
    store: &SessionStore,
    filename: &str,
    engine: &str,
    table: &LogTable,
    detection: &Detection,
    stats: &ParseStats,
    summary: &AnomalySummary,
) -> anyhow::Result<String> {
    let session_id = new_session_id();
    let ids = store.save_logs(&session_id, table)?;
    store.save_anomalies(&session_id, &ids, detection)?;

    let results = StoredResults {
        parse_stats: stats,
        anomaly_summary: summary,
    };
    store.save_session(&SessionRecord {
        session_id: session_id.clone(),
        filename: filename.to_string(),
        total_logs: table.len(),
        error_count: table.severity_count(&ERROR_SEVERITIES),
        anomaly_count: detection.indices.len(),
        processing_engine: engine.to_string(),
        analysis_results: serde_json::to_string(&results)?,
        created_at: None,
    })?;
    tracing::info!("stored session {session_id}");
    Ok(session_id)
}

/// Shape of the `analysis_results` blob stored with each session.
#[derive(Serialize)]
struct StoredResults<'a> {
    parse_stats: &'a ParseStats,
    anomaly_summary: &'a AnomalySummary,
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    filename: &'a str,
    /// Records that went into detection, after filters
    analyzed_records: usize,
    parse_stats: &'a ParseStats,
    anomaly_summary: &'a AnomalySummary,
    anomalies: Vec<FlaggedLine<'a>>,
    session_id: Option<&'a str>,
}

#[derive(Serialize)]
struct FlaggedLine<'a> {
    index: usize,
    line_number: usize,
    severity: &'a str,
    source: &'a str,
    message: &'a str,
    score: f64,
}

/// Translate a detection over a filtered view back onto full-table
/// positions. Unflagged positions keep a zero score.
fn remap_detection(detection: &Detection, positions: &[usize], total: usize) -> Detection {
    let mut scores = vec![0.0; total];
    for (local, &position) in positions.iter().enumerate() {
        if let Some(&score) = detection.scores.get(local) {
            scores[position] = score;
        }
    }
    let indices = detection
        .indices
        .iter()
        .filter_map(|&local| positions.get(local).copied())
        .collect();
    Detection { indices, scores }
}

fn flagged_lines<'a>(table: &'a LogTable, detection: &Detection) -> Vec<FlaggedLine<'a>> {
    detection
        .indices
        .iter()
        .filter_map(|&index| {
            let rec = table.records().get(index)?;
            Some(FlaggedLine {
                index,
                line_number: rec.line_number,
                severity: &rec.severity,
                source: &rec.source,
                message: &rec.message,
                score: detection.scores.get(index).copied().unwrap_or(0.0),
            })
        })
        .collect()
}

fn print_text_report(report: &AnalysisReport<'_>) {
    let stats = report.parse_stats;
    println!(
        "Analyzed {}: {} lines, {} parsed ({:.1}%)",
        report.filename, stats.total_lines, stats.parsed_lines, stats.success_rate
    );
    println!(
        "  {} sources, {:.1}% with timestamps, average message {:.0} chars",
        stats.sources_found, stats.timestamp_coverage, stats.average_message_length
    );
    if !stats.severities_found.is_empty() {
        println!("  severities: {}", join_counts(&stats.severities_found));
    }
    if !stats.patterns_used.is_empty() {
        println!("  patterns: {}", join_counts(&stats.patterns_used));
    }
    if report.analyzed_records != stats.total_lines {
        println!(
            "  filters kept {} records for detection",
            report.analyzed_records
        );
    }

    println!();
    let summary = report.anomaly_summary;
    if report.anomalies.is_empty() {
        println!("No anomalies detected.");
    } else {
        println!(
            "Flagged {} of {} records ({:.2}%)",
            summary.total_anomalies, report.analyzed_records, summary.anomaly_rate
        );
        if !summary.severity_distribution.is_empty() {
            println!(
                "  severities: {}",
                join_counts(&summary.severity_distribution)
            );
        }
        if !summary.common_words.is_empty() {
            let words: Vec<String> = summary
                .common_words
                .iter()
                .map(|(word, count)| format!("{word} ({count})"))
                .collect();
            println!("  recurring words: {}", words.join(", "));
        }
        if let Some(span) = &summary.time_distribution {
            println!(
                "  time span: {} to {} ({:.1} h)",
                span.earliest.format("%Y-%m-%d %H:%M:%S"),
                span.latest.format("%Y-%m-%d %H:%M:%S"),
                span.span_hours
            );
        }
        println!();
        for line in &report.anomalies {
            println!(
                "  line {:>5} [{:<7}] {}  (score {:.2})",
                line.line_number,
                line.severity,
                clip(line.message, 96),
                line.score
            );
        }
    }

    if let Some(session_id) = report.session_id {
        println!();
        println!("Session {session_id} saved.");
    }
}

fn join_counts(counts: &IndexMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(name, count)| format!("{name} {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn clip(text: &str, max_chars: usize) -> Cow<'_, str> {
    if text.chars().count() <= max_chars {
        Cow::Borrowed(text)
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        Cow::Owned(format!("{head}..."))
    }
}
