use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::anomaly::scorer::ScoringMethod;
use crate::core::LogTable;

/// Message fragments that tend to accompany trouble, matched against the
/// lowercased message.
const SUSPICIOUS_FRAGMENTS: [&str; 10] = [
    r"failed.*login",
    r"unauthorized.*access",
    r"connection.*refused",
    r"timeout.*exceeded",
    r"memory.*leak",
    r"stack.*overflow",
    r"null.*pointer",
    r"out.*of.*memory",
    r"deadlock.*detected",
    r"permission.*denied",
];

static SUSPICIOUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SUSPICIOUS_FRAGMENTS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex literal"))
        .collect()
});

// A character repeated eleven or more times in a row.
static REPEATED_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)\1{10,}").expect("valid regex literal"));

const MAX_MESSAGE_CHARS: usize = 1000;

/// Flags messages with suspicious wording or a degenerate shape.
/// Triggers do not add up; the strongest one wins.
pub struct KeywordScorer;

impl KeywordScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn score_message(message: &str) -> f64 {
        let mut score: f64 = 0.0;

        let lowered = message.to_lowercase();
        if SUSPICIOUS_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(&lowered).unwrap_or(false))
        {
            score = score.max(0.7);
        }

        if message.chars().count() > MAX_MESSAGE_CHARS {
            score = score.max(0.3);
        }

        if !message.is_ascii() {
            score = score.max(0.2);
        }

        if REPEATED_RUN.is_match(message).unwrap_or(false) {
            score = score.max(0.4);
        }

        score
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringMethod for KeywordScorer {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn scores(&self, table: &LogTable) -> Vec<f64> {
        table
            .records()
            .iter()
            .map(|rec| Self::score_message(&rec.message))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::record::LogRecord;

    #[test]
    fn test_suspicious_wording() {
        assert_eq!(
            KeywordScorer::score_message("Failed login attempt from 10.0.0.5"),
            0.7
        );
        assert_eq!(
            KeywordScorer::score_message("Unauthorized access to /admin"),
            0.7
        );
        assert_eq!(
            KeywordScorer::score_message("connection to db01 refused"),
            0.7
        );
    }

    #[test]
    fn test_oversized_message() {
        assert_eq!(KeywordScorer::score_message(&"ab".repeat(501)), 0.3);
        assert_eq!(KeywordScorer::score_message(&"ab".repeat(500)), 0.0);
    }

    #[test]
    fn test_non_ascii_message() {
        assert_eq!(KeywordScorer::score_message("café ouvert"), 0.2);
    }

    #[test]
    fn test_repeated_character_run() {
        assert_eq!(KeywordScorer::score_message(&"a".repeat(11)), 0.4);
        assert_eq!(KeywordScorer::score_message(&"a".repeat(10)), 0.0);
    }

    #[test]
    fn test_strongest_trigger_wins() {
        let message = format!("unauthorized access {}", "!".repeat(1200));
        assert_eq!(KeywordScorer::score_message(&message), 0.7);
    }

    #[test]
    fn test_normal_message() {
        assert_eq!(KeywordScorer::score_message("User session established"), 0.0);
    }

    #[test]
    fn test_scores_whole_table() {
        let records = vec![
            LogRecord {
                timestamp: None,
                severity: "INFO".to_string(),
                source: "unknown".to_string(),
                message: "permission denied for /etc/shadow".to_string(),
                line_number: 1,
                has_timestamp: false,
                message_length: 33,
                word_count: 4,
                pattern_used: "simple",
                raw_line: "permission denied for /etc/shadow".to_string(),
            },
            LogRecord {
                timestamp: None,
                severity: "INFO".to_string(),
                source: "unknown".to_string(),
                message: "heartbeat ok".to_string(),
                line_number: 2,
                has_timestamp: false,
                message_length: 12,
                word_count: 2,
                pattern_used: "simple",
                raw_line: "heartbeat ok".to_string(),
            },
        ];
        let table = LogTable::new(records);
        assert_eq!(KeywordScorer::new().scores(&table), vec![0.7, 0.0]);
    }
}
