use crate::anomaly::isolation::IsolationForest;
use crate::anomaly::percentile;
use crate::anomaly::scorer::ScoringMethod;
use crate::core::LogTable;

const MIN_SAMPLES: usize = 5;
const FOREST_TREES: usize = 100;
const FOREST_MAX_SAMPLES: usize = 256;
const FOREST_SEED: u64 = 42;

/// Flags records whose numeric shape stands out from the pack.
///
/// Each record is reduced to (message length, word count), standardized
/// per column, and scored with a seeded isolation forest. Records above
/// the top-decile forest score are flagged.
pub struct StatisticalScorer {
    forest: IsolationForest,
    contamination: f64,
}

impl StatisticalScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forest: IsolationForest::new(FOREST_TREES, FOREST_MAX_SAMPLES, FOREST_SEED),
            contamination: 0.1,
        }
    }
}

impl Default for StatisticalScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringMethod for StatisticalScorer {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn scores(&self, table: &LogTable) -> Vec<f64> {
        let n = table.len();
        if n < MIN_SAMPLES {
            return vec![0.0; n];
        }

        let mut features: Vec<Vec<f64>> = table
            .records()
            .iter()
            .map(|rec| vec![rec.message_length as f64, rec.word_count as f64])
            .collect();
        standardize(&mut features);

        let outlier_scores = self.forest.fit_score(&features);
        let mut sorted = outlier_scores.clone();
        sorted.sort_by(f64::total_cmp);
        let cutoff = percentile(&sorted, 100.0 * (1.0 - self.contamination));

        outlier_scores
            .iter()
            .map(|&s| if s > cutoff { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Zero-mean, unit-variance scaling per column. A constant column keeps
/// unit scale so it centers to zero without dividing by zero.
fn standardize(features: &mut [Vec<f64>]) {
    if features.is_empty() {
        return;
    }
    let n = features.len() as f64;
    let dims = features[0].len();
    for col in 0..dims {
        let mean = features.iter().map(|f| f[col]).sum::<f64>() / n;
        let variance = features.iter().map(|f| (f[col] - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        let scale = if std > 0.0 { std } else { 1.0 };
        for f in &mut *features {
            f[col] = (f[col] - mean) / scale;
        }
    }
}
