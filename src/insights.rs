//! Aggregate views over flagged records.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;

use crate::core::LogTable;

const TOP_WORDS: usize = 5;
const MIN_WORD_CHARS: usize = 3;

/// Time extent of the flagged records, present only when at least one of
/// them carries a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDistribution {
    pub earliest: DateTime<Local>,
    pub latest: DateTime<Local>,
    pub span_hours: f64,
}

/// What the flagged records have in common.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub total_anomalies: usize,
    pub anomaly_rate: f64,
    pub severity_distribution: IndexMap<String, usize>,
    pub common_words: Vec<(String, usize)>,
    pub time_distribution: Option<TimeDistribution>,
}

/// Summarize the records at `indices`: how many, how dense, which
/// severities, which recurring words, and what time range they cover.
#[must_use]
pub fn anomaly_summary(table: &LogTable, indices: &[usize]) -> AnomalySummary {
    if table.is_empty() || indices.is_empty() {
        return AnomalySummary::default();
    }

    let flagged = table.select(indices);

    let mut severities: IndexMap<String, usize> = IndexMap::new();
    for rec in flagged.records() {
        *severities.entry(rec.severity.clone()).or_insert(0) += 1;
    }
    severities.sort_by(|_, a, _, b| b.cmp(a));

    let mut words: IndexMap<String, usize> = IndexMap::new();
    for rec in flagged.records() {
        for token in rec.message.to_lowercase().split_whitespace() {
            if token.chars().count() > MIN_WORD_CHARS {
                *words.entry(token.to_string()).or_insert(0) += 1;
            }
        }
    }
    let mut common_words: Vec<(String, usize)> = words.into_iter().collect();
    common_words.sort_by(|a, b| b.1.cmp(&a.1));
    common_words.truncate(TOP_WORDS);

    let stamps: Vec<DateTime<Local>> = flagged
        .records()
        .iter()
        .filter_map(|rec| rec.timestamp)
        .collect();
    let time_distribution = match (stamps.iter().min(), stamps.iter().max()) {
        (Some(&earliest), Some(&latest)) => {
            let span_hours =
                latest.signed_duration_since(earliest).num_milliseconds() as f64 / 3_600_000.0;
            Some(TimeDistribution {
                earliest,
                latest,
                span_hours,
            })
        }
        _ => None,
    };

    AnomalySummary {
        total_anomalies: flagged.len(),
        anomaly_rate: flagged.len() as f64 / table.len() as f64 * 100.0,
        severity_distribution: severities,
        common_words,
        time_distribution,
    }
}
