use std::collections::VecDeque;

/// Label for points no cluster absorbs.
pub const NOISE: i32 = -1;

const UNVISITED: i32 = -2;

/// Density clustering with cosine distance over sparse L2-normalized rows.
///
/// `min_samples` counts the point itself. Neighborhoods are inclusive:
/// points exactly `eps` away still count.
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    #[must_use]
    pub const fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }

    /// Cluster labels per row: 0, 1, ... for clusters, `NOISE` otherwise.
    #[must_use]
    pub fn fit(&self, rows: &[Vec<(usize, f64)>]) -> Vec<i32> {
        let n = rows.len();
        let neighborhoods: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| cosine_distance(&rows[i], &rows[j]) <= self.eps)
                    .collect()
            })
            .collect();

        let mut labels = vec![UNVISITED; n];
        let mut cluster = 0;
        for i in 0..n {
            if labels[i] != UNVISITED {
                continue;
            }
            if neighborhoods[i].len() < self.min_samples {
                labels[i] = NOISE;
                continue;
            }
            labels[i] = cluster;
            let mut queue: VecDeque<usize> = neighborhoods[i].iter().copied().collect();
            while let Some(j) = queue.pop_front() {
                if labels[j] == NOISE {
                    // border point reached from a core point
                    labels[j] = cluster;
                }
                if labels[j] != UNVISITED {
                    continue;
                }
                labels[j] = cluster;
                if neighborhoods[j].len() >= self.min_samples {
                    queue.extend(neighborhoods[j].iter().copied());
                }
            }
            cluster += 1;
        }
        labels
    }
}

/// 1 - dot product. Rows are unit length, so a zero row is maximally far
/// from everything, including another zero row.
fn cosine_distance(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let mut dot = 0.0;
    let mut ai = 0;
    let mut bi = 0;
    while ai < a.len() && bi < b.len() {
        match a[ai].0.cmp(&b[bi].0) {
            std::cmp::Ordering::Less => ai += 1,
            std::cmp::Ordering::Greater => bi += 1,
            std::cmp::Ordering::Equal => {
                dot += a[ai].1 * b[bi].1;
                ai += 1;
                bi += 1;
            }
        }
    }
    1.0 - dot
}
