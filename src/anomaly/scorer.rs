use crate::core::LogTable;

/// Detection floor: tables smaller than this produce an empty result.
pub const MIN_RECORDS: usize = 10;

/// Largest share of a table the combiner will flag before capping.
pub const MAX_FLAGGED_SHARE: f64 = 0.2;

/// One ensemble member. Implementations score the whole table at once and
/// return one value per record in [0.0, 1.0] where higher = more anomalous.
pub trait ScoringMethod {
    fn name(&self) -> &'static str;

    /// Whether this method joins the ensemble for this table. A method
    /// that opts out consumes no weight slot.
    #[must_use]
    fn applies(&self, _table: &LogTable) -> bool {
        true
    }

    /// Score every record. Precondition failures (too few rows,
    /// degenerate input) yield an all-zero vector, never an error.
    fn scores(&self, table: &LogTable) -> Vec<f64>;
}

/// Outcome of one detection run.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Flagged positions, 0-based into the scored table. Ascending by
    /// index, except after capping where order follows ascending score.
    pub indices: Vec<usize>,
    /// Combined ensemble score for every record in the table.
    pub scores: Vec<f64>,
}

/// Weighted-average ensemble over an ordered set of scoring methods.
///
/// Weights are positional: the first N applicable methods take the first
/// N weights, renormalized to sum to 1.
pub struct EnsembleScorer {
    methods: Vec<Box<dyn ScoringMethod>>,
    weights: Vec<f64>,
    threshold: f64,
}

impl EnsembleScorer {
    #[must_use]
    pub const fn new(weights: Vec<f64>, threshold: f64) -> Self {
        Self {
            methods: Vec::new(),
            weights,
            threshold,
        }
    }

    #[must_use]
    pub fn add_method(mut self, method: Box<dyn ScoringMethod>) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn detect(&self, table: &LogTable) -> Detection {
        if table.len() < MIN_RECORDS {
            return Detection::default();
        }

        let mut stack: Vec<Vec<f64>> = Vec::new();
        for method in &self.methods {
            if method.applies(table) {
                let scores = method.scores(table);
                tracing::debug!("method {} scored {} records", method.name(), scores.len());
                stack.push(scores);
            } else {
                tracing::debug!("method {} not applicable, skipped", method.name());
            }
        }

        self.combine(table.len(), &stack)
    }

    fn combine(&self, total: usize, stack: &[Vec<f64>]) -> Detection {
        if stack.is_empty() {
            return Detection::default();
        }

        let weights: Vec<f64> = self.weights.iter().take(stack.len()).copied().collect();
        let weight_sum: f64 = weights.iter().sum();
        // A stack deeper than the weight table, or weightless methods,
        // leaves nothing sensible to average.
        if weights.len() < stack.len() || weight_sum <= 0.0 {
            return Detection::default();
        }

        let mut combined = vec![0.0; total];
        for (scores, weight) in stack.iter().zip(&weights) {
            for (acc, s) in combined.iter_mut().zip(scores) {
                *acc += s * weight;
            }
        }
        for acc in &mut combined {
            *acc /= weight_sum;
        }

        let mut flagged: Vec<usize> = combined
            .iter()
            .enumerate()
            .filter(|(_, &s)| s > self.threshold)
            .map(|(i, _)| i)
            .collect();

        // Keep the detector terse: when the threshold flags more than a
        // fifth of the table, keep only the top scorers.
        if flagged.len() as f64 > total as f64 * MAX_FLAGGED_SHARE {
            let keep = (total as f64 * MAX_FLAGGED_SHARE) as usize;
            let mut order: Vec<usize> = (0..total).collect();
            order.sort_by(|&a, &b| combined[a].total_cmp(&combined[b]));
            flagged = order.split_off(total - keep);
        }

        Detection {
            indices: flagged,
            scores: combined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::record::LogRecord;

    fn table_of(n: usize) -> LogTable {
        let records = (0..n)
            .map(|i| LogRecord {
                timestamp: None,
                severity: "INFO".to_string(),
                source: "unknown".to_string(),
                message: format!("event {i}"),
                line_number: i + 1,
                has_timestamp: false,
                message_length: 7,
                word_count: 2,
                pattern_used: "simple",
                raw_line: format!("event {i}"),
            })
            .collect();
        LogTable::new(records)
    }

    struct Constant {
        value: f64,
        active: bool,
    }

    impl ScoringMethod for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }
        fn applies(&self, _table: &LogTable) -> bool {
            self.active
        }
        fn scores(&self, table: &LogTable) -> Vec<f64> {
            vec![self.value; table.len()]
        }
    }

    struct Fixed(Vec<f64>);

    impl ScoringMethod for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn scores(&self, _table: &LogTable) -> Vec<f64> {
            self.0.clone()
        }
    }

    #[test]
    fn test_small_tables_return_empty() {
        let scorer = EnsembleScorer::new(vec![1.0], 0.0)
            .add_method(Box::new(Constant { value: 1.0, active: true }));
        let detection = scorer.detect(&table_of(MIN_RECORDS - 1));
        assert!(detection.indices.is_empty());
        assert!(detection.scores.is_empty());
    }

    #[test]
    fn test_weights_truncate_to_present_methods() {
        // Third weight is never used: only two methods are registered.
        let scorer = EnsembleScorer::new(vec![0.2, 0.25, 0.2], 0.5)
            .add_method(Box::new(Constant { value: 1.0, active: true }))
            .add_method(Box::new(Constant { value: 0.0, active: true }));
        let detection = scorer.detect(&table_of(10));
        let expected = 0.2 / 0.45;
        assert!((detection.scores[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_inapplicable_method_frees_its_weight_slot() {
        // The middle method opts out, so the third method slides into the
        // second weight slot.
        let scorer = EnsembleScorer::new(vec![0.5, 0.3, 0.2], 0.9)
            .add_method(Box::new(Constant { value: 1.0, active: true }))
            .add_method(Box::new(Constant { value: 1.0, active: false }))
            .add_method(Box::new(Constant { value: 0.0, active: true }));
        let detection = scorer.detect(&table_of(10));
        assert!((detection.scores[0] - 0.5 / 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_flagged_indices_ascend_when_uncapped() {
        let mut scores = vec![0.0; 10];
        scores[5] = 0.9;
        scores[0] = 0.8;
        let scorer = EnsembleScorer::new(vec![1.0], 0.3).add_method(Box::new(Fixed(scores)));
        let detection = scorer.detect(&table_of(10));
        assert_eq!(detection.indices, vec![0, 5]);
    }

    #[test]
    fn test_cap_keeps_top_scorers() {
        let scores: Vec<f64> = (0..10).map(|i| i as f64 / 10.0).collect();
        let scorer = EnsembleScorer::new(vec![1.0], 0.3).add_method(Box::new(Fixed(scores)));
        let detection = scorer.detect(&table_of(10));
        // 0.4 through 0.9 exceed the threshold, which is more than a fifth
        // of the table; only the top two survive, ascending by score.
        assert_eq!(detection.indices, vec![8, 9]);
        assert_eq!(detection.scores.len(), 10);
    }

    #[test]
    fn test_all_methods_inactive_yields_empty() {
        let scorer = EnsembleScorer::new(vec![1.0], 0.0)
            .add_method(Box::new(Constant { value: 1.0, active: false }));
        let detection = scorer.detect(&table_of(10));
        assert!(detection.indices.is_empty());
        assert!(detection.scores.is_empty());
    }

    #[test]
    fn test_more_methods_than_weights_is_a_combiner_failure() {
        let scorer = EnsembleScorer::new(vec![1.0], 0.0)
            .add_method(Box::new(Constant { value: 1.0, active: true }))
            .add_method(Box::new(Constant { value: 1.0, active: true }));
        let detection = scorer.detect(&table_of(10));
        assert!(detection.indices.is_empty());
    }
}
