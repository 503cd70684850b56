pub mod scorer;

pub mod keyword;
pub mod severity;
pub mod statistical;
pub mod temporal;
pub mod text;

pub mod dbscan;
pub mod isolation;
pub mod tfidf;

use keyword::KeywordScorer;
use severity::SeverityScorer;
use statistical::StatisticalScorer;
use temporal::TemporalScorer;
use text::TextScorer;

pub use scorer::{Detection, EnsembleScorer, ScoringMethod};

/// Relative method weights in stack order: statistical, text, temporal,
/// severity, keyword. Truncated to the methods present and renormalized
/// at combine time.
pub const ENSEMBLE_WEIGHTS: [f64; 5] = [0.2, 0.25, 0.2, 0.15, 0.2];

/// Combined score above which a record is flagged.
pub const ANOMALY_THRESHOLD: f64 = 0.3;

/// Create the default detection ensemble
#[must_use]
pub fn create_default_scorer() -> EnsembleScorer {
    EnsembleScorer::new(ENSEMBLE_WEIGHTS.to_vec(), ANOMALY_THRESHOLD)
        .add_method(Box::new(StatisticalScorer::new())) // numeric shape outliers
        .add_method(Box::new(TextScorer::new())) // unclusterable message text
        .add_method(Box::new(TemporalScorer::new())) // silences and bursts
        .add_method(Box::new(SeverityScorer::new())) // severity mix drift
        .add_method(Box::new(KeywordScorer::new())) // suspicious wording
}

/// Linear-interpolated percentile over an ascending-sorted slice.
pub(crate) const fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    // rank is non-negative, so truncation is floor.
    let lo = rank as usize;
    let frac = rank - lo as f64;
    if frac == 0.0 {
        sorted[lo]
    } else {
        sorted[lo] * (1.0 - frac) + sorted[lo + 1] * frac
    }
}
