pub mod patterns;
pub mod record;
pub mod timestamp;

use crate::core::LogTable;
use indexmap::IndexMap;
use rayon::prelude::*;
use record::LogRecord;
use serde::Serialize;
use std::collections::HashSet;

/// Parse one line of text into a normalized record.
///
/// The line is trimmed first; whitespace-only input yields `None`. Every
/// other input produces exactly one record, thanks to the fallback pattern.
#[must_use]
pub fn parse_line(line: &str, line_number: usize) -> Option<LogRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (entry, pattern_name) = patterns::match_line(trimmed);

    let severity = record::normalize_severity(entry.severity.as_deref().unwrap_or("INFO"));
    let ts = entry
        .timestamp
        .as_deref()
        .and_then(timestamp::parse_timestamp);
    let source = entry
        .source
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string());
    let message = entry
        .message
        .unwrap_or_else(|| trimmed.to_string())
        .trim()
        .to_string();
    let message_length = message.chars().count();
    let word_count = message.split_whitespace().count();

    Some(LogRecord {
        timestamp: ts,
        severity,
        source,
        message,
        line_number,
        has_timestamp: ts.is_some(),
        message_length,
        word_count,
        pattern_used: pattern_name,
        raw_line: trimmed.to_string(),
    })
}

/// Parse a whole text blob into a record table.
///
/// The blob is trimmed, then split on newlines. Blank interior lines are
/// dropped but keep their slot in the numbering, so surviving records carry
/// their original 1-based position. Empty input yields an empty table.
#[must_use]
pub fn parse_content(content: &str) -> LogTable {
    let trimmed = content.trim();
    let lines: Vec<&str> = trimmed.split('\n').collect();
    let total = lines.len();

    let records: Vec<LogRecord> = lines
        .par_iter()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(line, idx + 1))
        .collect();

    tracing::debug!("parsed {} records from {total} input lines", records.len());
    LogTable::new(records)
}

/// Diagnostic counters describing one parse run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseStats {
    pub total_lines: usize,
    /// Records that matched a real pattern (not the fallback)
    pub parsed_lines: usize,
    /// `parsed_lines` over `total_lines`, as a percentage
    pub success_rate: f64,
    /// Per-pattern record counts, most used first
    pub patterns_used: IndexMap<String, usize>,
    /// Per-severity record counts, most frequent first
    pub severities_found: IndexMap<String, usize>,
    /// Number of distinct sources
    pub sources_found: usize,
    /// Percentage of records carrying a timestamp
    pub timestamp_coverage: f64,
    pub average_message_length: f64,
}

/// Compute parse statistics over a table. An empty table short-circuits to
/// an all-zero stats record.
#[must_use]
pub fn parsing_stats(table: &LogTable) -> ParseStats {
    if table.is_empty() {
        return ParseStats::default();
    }

    let total = table.len();
    let mut patterns_used: IndexMap<String, usize> = IndexMap::new();
    let mut severities_found: IndexMap<String, usize> = IndexMap::new();
    let mut sources: HashSet<&str> = HashSet::new();
    let mut with_timestamp = 0usize;
    let mut message_length_sum = 0usize;

    for rec in table.records() {
        *patterns_used.entry(rec.pattern_used.to_string()).or_insert(0) += 1;
        *severities_found.entry(rec.severity.clone()).or_insert(0) += 1;
        sources.insert(rec.source.as_str());
        if rec.has_timestamp {
            with_timestamp += 1;
        }
        message_length_sum += rec.message_length;
    }

    patterns_used.sort_by(|_, a, _, b| b.cmp(a));
    severities_found.sort_by(|_, a, _, b| b.cmp(a));

    let parsed_lines = total
        - patterns_used
            .get(patterns::FALLBACK)
            .copied()
            .unwrap_or(0);

    ParseStats {
        total_lines: total,
        parsed_lines,
        success_rate: parsed_lines as f64 / total as f64 * 100.0,
        patterns_used,
        severities_found,
        sources_found: sources.len(),
        timestamp_coverage: with_timestamp as f64 / total as f64 * 100.0,
        average_message_length: message_length_sum as f64 / total as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_nonblank_line_yields_one_record() {
        let content = "first event\n\nsecond event\nthird event";
        let table = parse_content(content);
        assert_eq!(table.len(), 3);
        let numbers: Vec<usize> = table.records().iter().map(|r| r.line_number).collect();
        assert_eq!(numbers, vec![1, 3, 4]);
    }

    #[test]
    fn test_leading_blank_lines_trimmed_before_numbering() {
        let table = parse_content("\n\nalpha\nbeta");
        let numbers: Vec<usize> = table.records().iter().map(|r| r.line_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_empty_input_yields_empty_table() {
        assert!(parse_content("").is_empty());
        assert!(parse_content("   \n \t \n").is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let content = "2023-01-01 12:00:00 [ERROR] db: down\nJan 15 08:30:00 sshd warn: retry\n???";
        let first = parse_content(content);
        let second = parse_content(content);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_record_shape() {
        let rec = parse_line("  ###???***  ", 7).unwrap();
        assert_eq!(rec.severity, "INFO");
        assert_eq!(rec.source, "unknown");
        assert_eq!(rec.pattern_used, patterns::FALLBACK);
        assert_eq!(rec.message, "###???***");
        assert_eq!(rec.raw_line, "###???***");
        assert_eq!(rec.line_number, 7);
        assert!(rec.timestamp.is_none());
        assert!(!rec.has_timestamp);
    }

    #[test]
    fn test_post_processing_normalizes_fields() {
        let rec = parse_line("2023-01-01 12:00:00 [warn] db: disk  low", 1).unwrap();
        assert_eq!(rec.severity, "WARNING");
        assert!(rec.has_timestamp);
        assert_eq!(rec.source, "db");
        assert_eq!(rec.message, "disk  low");
        assert_eq!(rec.message_length, 9);
        assert_eq!(rec.word_count, 2);
    }

    #[test]
    fn test_unicode_message_length_counts_chars() {
        let rec = parse_line("INFO caf\u{e9} r\u{e9}union", 1).unwrap();
        assert_eq!(rec.message, "caf\u{e9} r\u{e9}union");
        assert_eq!(rec.message_length, 12);
        assert_eq!(rec.word_count, 2);
    }

    #[test]
    fn test_stats_over_mixed_content() {
        let content = "\
2023-01-01 12:00:00 [ERROR] db: down
2023-01-01 12:00:01 [ERROR] db: still down
???
Jan 15 08:30:00 sshd info: session opened";
        let table = parse_content(content);
        let stats = parsing_stats(&table);

        assert_eq!(stats.total_lines, 4);
        assert_eq!(stats.parsed_lines, 3);
        assert!((stats.success_rate - 75.0).abs() < 1e-9);
        assert_eq!(stats.patterns_used.get("standard"), Some(&2));
        assert_eq!(stats.patterns_used.get("syslog"), Some(&1));
        assert_eq!(stats.patterns_used.get(patterns::FALLBACK), Some(&1));
        // Most used pattern listed first
        assert_eq!(
            stats.patterns_used.first().map(|(k, _)| k.as_str()),
            Some("standard")
        );
        assert_eq!(stats.severities_found.get("ERROR"), Some(&2));
        assert_eq!(stats.severities_found.get("INFO"), Some(&2));
        // db, sshd, unknown
        assert_eq!(stats.sources_found, 3);
        assert!((stats.timestamp_coverage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty_table_all_zero() {
        let stats = parsing_stats(&parse_content(""));
        assert_eq!(stats.total_lines, 0);
        assert_eq!(stats.parsed_lines, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.patterns_used.is_empty());
        assert!(stats.severities_found.is_empty());
        assert_eq!(stats.sources_found, 0);
    }
}
