use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation forest outlier scoring.
///
/// Points that random axis-aligned splits separate quickly are anomalous.
/// Scores land in (0, 1) with roughly 0.5 for unremarkable points.
pub struct IsolationForest {
    trees: usize,
    max_samples: usize,
    seed: u64,
}

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl IsolationForest {
    #[must_use]
    pub const fn new(trees: usize, max_samples: usize, seed: u64) -> Self {
        Self {
            trees,
            max_samples,
            seed,
        }
    }

    /// Fit on `data` and return one outlier score per row. The seed fixes
    /// every subsample and split, so repeated calls agree exactly.
    #[must_use]
    pub fn fit_score(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let n = data.len();
        if n == 0 {
            return Vec::new();
        }

        let sample_size = self.max_samples.min(n);
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut forest = Vec::with_capacity(self.trees);
        for _ in 0..self.trees {
            let mut rows: Vec<usize> = (0..n).collect();
            for i in 0..sample_size {
                let j = rng.gen_range(i..n);
                rows.swap(i, j);
            }
            forest.push(build_tree(data, &mut rows[..sample_size], 0, height_limit, &mut rng));
        }

        let normalizer = average_path_length(sample_size);
        data.iter()
            .map(|point| {
                let mean_path = forest
                    .iter()
                    .map(|tree| path_length(tree, point, 0.0))
                    .sum::<f64>()
                    / self.trees as f64;
                if normalizer > 0.0 {
                    (-mean_path / normalizer).exp2()
                } else {
                    0.5
                }
            })
            .collect()
    }
}

fn build_tree(
    data: &[Vec<f64>],
    rows: &mut [usize],
    depth: usize,
    limit: usize,
    rng: &mut StdRng,
) -> Node {
    if rows.len() <= 1 || depth >= limit {
        return Node::Leaf { size: rows.len() };
    }

    let dims = data[rows[0]].len();
    let candidates: Vec<usize> = (0..dims)
        .filter(|&d| {
            let (lo, hi) = span(data, rows, d);
            hi > lo
        })
        .collect();
    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let feature = candidates[rng.gen_range(0..candidates.len())];
    let (lo, hi) = span(data, rows, feature);
    let threshold = rng.gen_range(lo..hi);

    let mut split_at = 0;
    for i in 0..rows.len() {
        if data[rows[i]][feature] < threshold {
            rows.swap(i, split_at);
            split_at += 1;
        }
    }
    // gen_range can land exactly on the minimum, leaving one side empty.
    if split_at == 0 || split_at == rows.len() {
        return Node::Leaf { size: rows.len() };
    }

    let (left_rows, right_rows) = rows.split_at_mut(split_at);
    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(data, left_rows, depth + 1, limit, rng)),
        right: Box::new(build_tree(data, right_rows, depth + 1, limit, rng)),
    }
}

fn span(data: &[Vec<f64>], rows: &[usize], feature: usize) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &row in rows {
        let value = data[row][feature];
        lo = lo.min(value);
        hi = hi.max(value);
    }
    (lo, hi)
}

fn path_length(node: &Node, point: &[f64], depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if point[*feature] < *threshold {
                path_length(left, point, depth + 1.0)
            } else {
                path_length(right, point, depth + 1.0)
            }
        }
    }
}

/// Expected path length of an unsuccessful search in a binary tree over
/// `n` points, the standard c(n) normalizer.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered_with_outlier() -> Vec<Vec<f64>> {
        let mut data = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                data.push(vec![f64::from(i) * 0.1, f64::from(j) * 0.1]);
            }
        }
        data.push(vec![10.0, 10.0]);
        data
    }

    #[test]
    fn test_outlier_scores_highest() {
        let forest = IsolationForest::new(100, 256, 42);
        let data = clustered_with_outlier();
        let scores = forest.fit_score(&data);
        let outlier = scores[scores.len() - 1];
        for &s in &scores[..scores.len() - 1] {
            assert!(outlier > s, "outlier {outlier} not above inlier {s}");
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let forest = IsolationForest::new(50, 256, 42);
        let data = clustered_with_outlier();
        assert_eq!(forest.fit_score(&data), forest.fit_score(&data));
    }

    #[test]
    fn test_identical_points_score_alike() {
        let forest = IsolationForest::new(50, 256, 7);
        let data = vec![vec![1.0, 2.0]; 20];
        let scores = forest.fit_score(&data);
        for &s in &scores {
            assert!((s - scores[0]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_input() {
        let forest = IsolationForest::new(10, 256, 1);
        assert!(forest.fit_score(&[]).is_empty());
    }

    #[test]
    fn test_average_path_length_growth() {
        assert_eq!(average_path_length(1), 0.0);
        assert!(average_path_length(10) < average_path_length(100));
    }
}
