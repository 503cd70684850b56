use chrono::{DateTime, Local};
use serde::Serialize;

/// Column order for table rendering and export.
/// Consumers may rely on this for display, never for correctness.
pub const COLUMN_ORDER: [&str; 10] = [
    "timestamp",
    "severity",
    "source",
    "message",
    "line_number",
    "has_timestamp",
    "message_length",
    "word_count",
    "pattern_used",
    "raw_line",
];

/// One parsed log line in normalized form.
///
/// Built once by the parser and never mutated afterwards. Field order
/// matches [`COLUMN_ORDER`] so serialized output lines up with exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Coerced timestamp, or `None` when the line carried none we understand
    pub timestamp: Option<DateTime<Local>>,
    /// Normalized severity (FATAL/ERROR/WARNING/INFO/DEBUG, or an
    /// unrecognized token passed through uppercased)
    pub severity: String,
    /// Originating component, "unknown" when the pattern captured none
    pub source: String,
    pub message: String,
    /// 1-based position in the input text
    pub line_number: usize,
    pub has_timestamp: bool,
    /// Character count of `message`
    pub message_length: usize,
    /// Whitespace-separated token count of `message`
    pub word_count: usize,
    /// Name of the pattern that matched, "fallback" when none did
    pub pattern_used: &'static str,
    /// The trimmed input line
    pub raw_line: String,
}

/// Map a raw severity token onto the canonical level set.
/// Case-insensitive; unrecognized tokens pass through uppercased.
#[must_use]
pub fn normalize_severity(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.as_str() {
        "FATAL" | "CRITICAL" => "FATAL".to_string(),
        "ERROR" | "ERR" => "ERROR".to_string(),
        "WARN" | "WARNING" => "WARNING".to_string(),
        "INFO" | "INFORMATION" | "NOTICE" | "TEST" | "REST" | "JSON" | "RAW" => "INFO".to_string(),
        "DEBUG" | "TRACE" => "DEBUG".to_string(),
        _ => upper,
    }
}
