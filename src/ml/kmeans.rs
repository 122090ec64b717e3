use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{MlError, check_rows};

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<Vec<f64>>,
    /// Cluster of each input row.
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub n_iter: usize,
}

impl KMeansFit {
    /// Nearest centroid; ties go to the lowest index.
    pub fn predict(&self, row: &[f64]) -> usize {
        nearest(&self.centroids, row).0
    }

    /// Rows per cluster, always `k` entries.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

/// Lloyd's algorithm with k-means++ seeding and restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence tolerance, relative to the mean per-feature variance.
    pub tol: f64,
    pub seed: u64,
}

impl KMeans {
    pub fn new(n_clusters: usize, seed: u64) -> Self {
        Self {
            n_clusters,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed,
        }
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Runs `n_init` seeded restarts and keeps the lowest inertia (earliest on ties).
    pub fn fit(&self, rows: &[Vec<f64>]) -> Result<KMeansFit, MlError> {
        let width = check_rows(rows)?;
        if self.n_clusters == 0 || rows.len() < self.n_clusters {
            return Err(MlError::TooFewSamples {
                needed: self.n_clusters.max(1),
                got: rows.len(),
            });
        }

        let tol = self.tol * mean_variance(rows, width);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;

        for _ in 0..self.n_init.max(1) {
            let seeds = plus_plus_init(rows, self.n_clusters, &mut rng);
            let fit = lloyd(rows, seeds, self.max_iter, tol);
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.ok_or(MlError::EmptyInput)
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// `(index, squared distance)` of the closest centroid.
fn nearest(centroids: &[Vec<f64>], row: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(c, row);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn mean_variance(rows: &[Vec<f64>], width: usize) -> f64 {
    let n = rows.len() as f64;
    let total: f64 = (0..width)
        .map(|j| {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
            rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n
        })
        .sum();
    total / width.max(1) as f64
}

/// Index drawn with probability proportional to `weights`.
fn weighted_pick(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }
    let target = rng.r#gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > target {
            return i;
        }
    }
    weights.len() - 1
}

/// Greedy k-means++: each new centre is the best of `2 + ln(k)` weighted draws.
fn plus_plus_init(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = rows.len();
    let trials = 2 + (k as f64).ln().floor() as usize;

    let first = rng.gen_range(0..n);
    let mut centroids = vec![rows[first].clone()];
    let mut closest: Vec<f64> = rows
        .iter()
        .map(|r| squared_distance(r, &rows[first]))
        .collect();

    while centroids.len() < k {
        let mut chosen: Option<(usize, f64, Vec<f64>)> = None;

        for _ in 0..trials {
            let candidate = weighted_pick(&closest, rng);
            let updated: Vec<f64> = rows
                .iter()
                .zip(&closest)
                .map(|(r, &c)| c.min(squared_distance(r, &rows[candidate])))
                .collect();
            let potential: f64 = updated.iter().sum();

            if chosen.as_ref().is_none_or(|(_, p, _)| potential < *p) {
                chosen = Some((candidate, potential, updated));
            }
        }

        if let Some((index, _, updated)) = chosen {
            centroids.push(rows[index].clone());
            closest = updated;
        }
    }

    centroids
}

fn assign(rows: &[Vec<f64>], centroids: &[Vec<f64>]) -> (Vec<usize>, Vec<f64>) {
    rows.iter().map(|r| nearest(centroids, r)).unzip()
}

fn lloyd(rows: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeansFit {
    let k = centroids.len();
    let width = rows[0].len();
    let mut n_iter = 0;

    for _ in 0..max_iter {
        n_iter += 1;
        let (labels, distances) = assign(rows, &centroids);

        let mut sums = vec![vec![0.0; width]; k];
        let mut counts = vec![0usize; k];
        for (row, &l) in rows.iter().zip(&labels) {
            counts[l] += 1;
            for (s, v) in sums[l].iter_mut().zip(row) {
                *s += v;
            }
        }

        // Empty clusters take the points farthest from their current centre.
        let mut far: Vec<usize> = (0..rows.len()).collect();
        far.sort_by(|&a, &b| distances[b].total_cmp(&distances[a]));
        let mut far = far.into_iter();

        let mut shift = 0.0;
        for c in 0..k {
            let next = if counts[c] == 0 {
                match far.next() {
                    Some(p) => rows[p].clone(),
                    None => centroids[c].clone(),
                }
            } else {
                sums[c].iter().map(|s| s / counts[c] as f64).collect()
            };
            shift += squared_distance(&centroids[c], &next);
            centroids[c] = next;
        }

        if shift <= tol {
            break;
        }
    }

    let (labels, distances) = assign(rows, &centroids);
    KMeansFit {
        centroids,
        labels,
        inertia: distances.iter().sum(),
        n_iter,
    }
}
