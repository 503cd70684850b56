use std::collections::BTreeMap;
use std::sync::LazyLock;

use ahash::{AHashMap, AHashSet};

/// Conventional English stop-word list used for log-message vectorization.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fify", "fill", "find", "fire", "first",
    "five", "for", "former", "formerly", "forty", "found", "four", "from", "front", "full",
    "further", "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together",
    "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];

static STOP_WORDS: LazyLock<AHashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Sparse tf-idf matrix. Rows hold (term index, weight) pairs sorted by
/// term index and L2-normalized.
pub struct TfidfMatrix {
    pub rows: Vec<Vec<(usize, f64)>>,
    pub vocabulary: Vec<String>,
}

/// Unigram-plus-bigram tf-idf over pre-cleaned documents.
///
/// Terms are indexed alphabetically. When the vocabulary overflows
/// `max_features`, the most frequent terms across the corpus survive,
/// with alphabetical order breaking ties.
pub struct TfidfVectorizer {
    max_features: usize,
    min_df: usize,
}

impl TfidfVectorizer {
    #[must_use]
    pub const fn new(max_features: usize, min_df: usize) -> Self {
        Self {
            max_features,
            min_df,
        }
    }

    /// Weight every document; `None` when no term survives the
    /// document-frequency cutoff.
    #[must_use]
    pub fn fit_transform(&self, docs: &[String]) -> Option<TfidfMatrix> {
        let term_docs: Vec<Vec<String>> = docs
            .iter()
            .map(|doc| terms_of(&tokenize(doc)))
            .collect();

        // (document frequency, corpus frequency) per term, alphabetical
        let mut stats: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for terms in &term_docs {
            let mut seen: AHashSet<&str> = AHashSet::new();
            for term in terms {
                let entry = stats.entry(term.clone()).or_insert((0, 0));
                entry.1 += 1;
                if seen.insert(term) {
                    entry.0 += 1;
                }
            }
        }

        let mut kept: Vec<(String, usize, usize)> = stats
            .into_iter()
            .filter(|(_, (df, _))| *df >= self.min_df)
            .map(|(term, (df, cf))| (term, df, cf))
            .collect();
        if kept.is_empty() {
            return None;
        }
        if kept.len() > self.max_features {
            kept.sort_by(|a, b| b.2.cmp(&a.2));
            kept.truncate(self.max_features);
            kept.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let index: AHashMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(i, (term, _, _))| (term.as_str(), i))
            .collect();
        let n_docs = docs.len() as f64;
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, df, _)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let rows = term_docs
            .iter()
            .map(|terms| {
                let mut counts: AHashMap<usize, f64> = AHashMap::new();
                for term in terms {
                    if let Some(&i) = index.get(term.as_str()) {
                        *counts.entry(i).or_insert(0.0) += 1.0;
                    }
                }
                let mut row: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(i, tf)| (i, tf * idf[i]))
                    .collect();
                row.sort_by_key(|&(i, _)| i);
                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in &mut row {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        Some(TfidfMatrix {
            rows,
            vocabulary: kept.into_iter().map(|(term, _, _)| term).collect(),
        })
    }
}

/// Whitespace tokens of at least two characters, stop words removed.
fn tokenize(doc: &str) -> Vec<String> {
    doc.split_whitespace()
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !STOP_WORDS.contains(*token))
        .map(str::to_string)
        .collect()
}

/// Unigrams plus adjacent-pair bigrams, built after stop-word removal.
fn terms_of(tokens: &[String]) -> Vec<String> {
    let mut terms = tokens.to_vec();
    for pair in tokens.windows(2) {
        terms.push(format!("{} {}", pair[0], pair[1]));
    }
    terms
}
