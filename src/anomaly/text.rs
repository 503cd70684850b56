use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::anomaly::dbscan::{Dbscan, NOISE};
use crate::anomaly::scorer::ScoringMethod;
use crate::anomaly::tfidf::TfidfVectorizer;
use crate::core::LogTable;

const MIN_SAMPLES: usize = 5;

static DATE_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex literal"));
static TIME_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}").expect("valid regex literal"));
static IP_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d+\.\d+\.\d+\b").expect("valid regex literal"));
static NUMBER_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("valid regex literal"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex literal"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex literal"));

/// Strip volatile tokens so structurally similar messages compare equal.
/// Dates, times, addresses and bare numbers go first, then punctuation
/// collapses to spaces.
#[must_use]
pub fn clean_message(message: &str) -> String {
    let cleaned = DATE_TOKENS.replace_all(message, "");
    let cleaned = TIME_TOKENS.replace_all(&cleaned, "");
    let cleaned = IP_TOKENS.replace_all(&cleaned, "");
    let cleaned = NUMBER_TOKENS.replace_all(&cleaned, "");
    let cleaned = PUNCTUATION.replace_all(&cleaned, " ");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    cleaned.trim().to_lowercase()
}

/// Flags records whose cleaned message text clusters with nothing else.
///
/// Messages are vectorized with unigram+bigram tf-idf and clustered with
/// cosine DBSCAN; noise points score 1.0.
pub struct TextScorer {
    vectorizer: TfidfVectorizer,
    clustering: Dbscan,
}

impl TextScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(1000, 2),
            clustering: Dbscan::new(0.5, 3),
        }
    }
}

impl Default for TextScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringMethod for TextScorer {
    fn name(&self) -> &'static str {
        "text"
    }

    fn scores(&self, table: &LogTable) -> Vec<f64> {
        let n = table.len();
        if n < MIN_SAMPLES {
            return vec![0.0; n];
        }

        let cleaned: Vec<String> = table
            .records()
            .iter()
            .map(|rec| clean_message(&rec.message))
            .collect();

        let Some(matrix) = self.vectorizer.fit_transform(&cleaned) else {
            return vec![0.0; n];
        };

        self.clustering
            .fit(&matrix.rows)
            .into_iter()
            .map(|label| if label == NOISE { 1.0 } else { 0.0 })
            .collect()
    }
}
