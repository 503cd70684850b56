use chrono::{DateTime, Local};

use crate::anomaly::percentile;
use crate::anomaly::scorer::ScoringMethod;
use crate::core::LogTable;

/// The ensemble only consults this method when strictly more than this
/// many records carry a timestamp.
pub const MIN_TIMESTAMPED: usize = 10;

const MIN_GAPS: usize = 5;

/// Flags records that follow an unusual silence or an unusual burst.
///
/// Timestamped records are ordered by time and the gaps between
/// neighbors are fenced with the standard 1.5 IQR rule. A gap outside
/// the fences marks its later endpoint, addressed by original position.
pub struct TemporalScorer;

impl TemporalScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for TemporalScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringMethod for TemporalScorer {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn applies(&self, table: &LogTable) -> bool {
        table
            .records()
            .iter()
            .filter(|rec| rec.timestamp.is_some())
            .count()
            > MIN_TIMESTAMPED
    }

    fn scores(&self, table: &LogTable) -> Vec<f64> {
        let mut scores = vec![0.0; table.len()];

        let mut stamped: Vec<(usize, DateTime<Local>)> = table
            .records()
            .iter()
            .enumerate()
            .filter_map(|(i, rec)| rec.timestamp.map(|ts| (i, ts)))
            .collect();
        if stamped.len() < MIN_TIMESTAMPED {
            return scores;
        }
        stamped.sort_by_key(|&(_, ts)| ts);

        let gaps: Vec<f64> = stamped
            .windows(2)
            .map(|pair| seconds_between(pair[0].1, pair[1].1))
            .collect();
        if gaps.len() < MIN_GAPS {
            return scores;
        }

        let mut sorted = gaps.clone();
        sorted.sort_by(f64::total_cmp);
        let q1 = percentile(&sorted, 25.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let lower = q1 - 1.5 * iqr;
        let upper = q3 + 1.5 * iqr;

        for (i, &gap) in gaps.iter().enumerate() {
            if gap < lower || gap > upper {
                scores[stamped[i + 1].0] = 1.0;
            }
        }
        scores
    }
}

fn seconds_between(earlier: DateTime<Local>, later: DateTime<Local>) -> f64 {
    let delta = later.signed_duration_since(earlier);
    delta.num_microseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1_000.0,
        |us| us as f64 / 1_000_000.0,
    )
}
