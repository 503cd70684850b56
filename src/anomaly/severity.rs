use ahash::AHashMap;

use crate::anomaly::scorer::ScoringMethod;
use crate::core::LogTable;

/// Share below which a severity counts as rare.
const RARE_SHARE: f64 = 0.01;

/// Healthy frequency range for one severity, as shares of the table.
#[derive(Debug, Clone, Copy)]
pub struct SeverityBand {
    pub severity: &'static str,
    pub min: f64,
    pub max: f64,
}

/// What a well-behaved log tends to look like.
pub const EXPECTED_BANDS: [SeverityBand; 5] = [
    SeverityBand {
        severity: "ERROR",
        min: 0.001,
        max: 0.1,
    },
    SeverityBand {
        severity: "FATAL",
        min: 0.0001,
        max: 0.05,
    },
    SeverityBand {
        severity: "WARNING",
        min: 0.01,
        max: 0.3,
    },
    SeverityBand {
        severity: "INFO",
        min: 0.3,
        max: 0.95,
    },
    SeverityBand {
        severity: "DEBUG",
        min: 0.0,
        max: 0.5,
    },
];

/// Flags records whose severity is distributed abnormally.
///
/// A severity outside its expected frequency band scores its records
/// 0.5. Any severity rarer than one percent of the table scores 1.0,
/// overriding the band score.
pub struct SeverityScorer {
    bands: Vec<SeverityBand>,
}

impl SeverityScorer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_bands(EXPECTED_BANDS.to_vec())
    }

    #[must_use]
    pub const fn with_bands(bands: Vec<SeverityBand>) -> Self {
        Self { bands }
    }
}

impl Default for SeverityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringMethod for SeverityScorer {
    fn name(&self) -> &'static str {
        "severity"
    }

    fn scores(&self, table: &LogTable) -> Vec<f64> {
        let n = table.len();
        let mut scores = vec![0.0; n];
        if n == 0 {
            return scores;
        }

        let mut counts: AHashMap<&str, usize> = AHashMap::new();
        for rec in table.records() {
            *counts.entry(rec.severity.as_str()).or_insert(0) += 1;
        }
        let shares: AHashMap<&str, f64> = counts
            .into_iter()
            .map(|(severity, count)| (severity, count as f64 / n as f64))
            .collect();

        for band in &self.bands {
            let actual = shares.get(band.severity).copied().unwrap_or(0.0);
            if actual < band.min || actual > band.max {
                for (score, rec) in scores.iter_mut().zip(table.records()) {
                    if rec.severity == band.severity {
                        *score = 0.5;
                    }
                }
            }
        }

        for (score, rec) in scores.iter_mut().zip(table.records()) {
            if shares.get(rec.severity.as_str()).copied().unwrap_or(0.0) < RARE_SHARE {
                *score = 1.0;
            }
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::record::LogRecord;

    fn record(severity: &str) -> LogRecord {
        LogRecord {
            timestamp: None,
            severity: severity.to_string(),
            source: "unknown".to_string(),
            message: "event".to_string(),
            line_number: 1,
            has_timestamp: false,
            message_length: 5,
            word_count: 1,
            pattern_used: "simple",
            raw_line: "event".to_string(),
        }
    }

    fn table(severities: &[(&str, usize)]) -> LogTable {
        let mut records = Vec::new();
        for &(severity, count) in severities {
            records.extend((0..count).map(|_| record(severity)));
        }
        LogTable::new(records)
    }

    #[test]
    fn test_healthy_mix_scores_zero() {
        // INFO 80%, WARNING 12%, ERROR 5%, DEBUG 3%: all inside bands,
        // none rare.
        let table = table(&[("INFO", 80), ("WARNING", 12), ("ERROR", 5), ("DEBUG", 3)]);
        let scores = SeverityScorer::new().scores(&table);
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_band_violation_scores_half() {
        // ERROR at 40% blows its band, but 40% is not rare.
        let table = table(&[("INFO", 60), ("ERROR", 40)]);
        let scores = SeverityScorer::new().scores(&table);
        for (i, rec) in table.records().iter().enumerate() {
            if rec.severity == "ERROR" {
                assert_eq!(scores[i], 0.5);
            } else {
                assert_eq!(scores[i], 0.0);
            }
        }
    }

    #[test]
    fn test_rare_severity_overrides_band_score() {
        // One FATAL among 200 records: 0.5% share, inside FATAL's band
        // but rare, so the override fires.
        let table = table(&[("INFO", 188), ("WARNING", 11), ("FATAL", 1)]);
        let scores = SeverityScorer::new().scores(&table);
        assert_eq!(scores[199], 1.0);
        assert!(scores[..199].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_unknown_severity_only_rare_rule_applies() {
        // NOTICE has no band; at 50% it is neither banded nor rare.
        let table = table(&[("INFO", 50), ("NOTICE", 50)]);
        let scores = SeverityScorer::new().scores(&table);
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_custom_bands_replace_defaults() {
        let scorer = SeverityScorer::with_bands(vec![SeverityBand {
            severity: "AUDIT",
            min: 0.9,
            max: 1.0,
        }]);
        let table = table(&[("AUDIT", 10), ("INFO", 10)]);
        let scores = scorer.scores(&table);
        // AUDIT at 50% misses its custom band; INFO has no band here.
        for (i, rec) in table.records().iter().enumerate() {
            if rec.severity == "AUDIT" {
                assert_eq!(scores[i], 0.5);
            } else {
                assert_eq!(scores[i], 0.0);
            }
        }
    }
}
