//! Second-order gradient boosting for squared error.
//!
//! Each round fits a regression tree to the gradients `pred - y` (hessian `1`). Leaf weights
//! are `-G / (H + lambda)`, and split gain is
//! `0.5 * (GL^2/(HL+lambda) + GR^2/(HR+lambda) - G^2/(H+lambda))`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

use super::error::{MlError, check_rows, check_targets};
use super::tree::{Tree, midpoint, sorted_by_feature};

/// Hyper-parameters of [`GradientBoostingRegressor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// L2 penalty on leaf weights.
    pub lambda: f64,
    /// Minimum hessian sum per child.
    pub min_child_weight: f64,
    /// Row fraction sampled per round (`1.0` uses every row).
    pub subsample: f64,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.1,
            lambda: 1.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    base_score: f64,
    trees: Vec<Tree<f64>>,
}

struct GradientGrower<'a> {
    rows: &'a [Vec<f64>],
    grad: &'a [f64],
    params: &'a BoostingParams,
    n_features: usize,
    tree: Tree<f64>,
}

impl GradientBoostingRegressor {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) -> Result<(), MlError> {
        let n_features = check_rows(rows)?;
        check_targets(rows.len(), targets.len())?;

        let n = rows.len();
        self.base_score = targets.iter().sum::<f64>() / n as f64;
        self.trees.clear();

        let mut predictions = vec![self.base_score; n];
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let sample_size = ((n as f64 * self.params.subsample).round() as usize).clamp(1, n);

        for _ in 0..self.params.n_estimators {
            let grad: Vec<f64> = predictions.iter().zip(targets).map(|(p, y)| p - y).collect();

            let samples: Vec<usize> = if sample_size < n {
                index::sample(&mut rng, n, sample_size).into_vec()
            } else {
                (0..n).collect()
            };

            let mut grower = GradientGrower {
                rows,
                grad: &grad,
                params: &self.params,
                n_features,
                tree: Tree::new(),
            };
            grower.grow(samples, 0);
            let tree = grower.tree;

            for (pred, row) in predictions.iter_mut().zip(rows) {
                *pred += tree.leaf(row);
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.leaf(row)).sum::<f64>()
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}

impl GradientGrower<'_> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let g: f64 = samples.iter().map(|&s| self.grad[s]).sum();
        let h = samples.len() as f64;

        // Shrinkage folded into the stored leaf weight.
        let weight = -g / (h + self.params.lambda) * self.params.learning_rate;
        let id = self.tree.push_leaf(weight);

        if depth >= self.params.max_depth || h < 2.0 * self.params.min_child_weight {
            return id;
        }

        let parent = self.score(g, h);
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..self.n_features {
            let sorted = sorted_by_feature(self.rows, &samples, feature);
            let mut gl = 0.0;
            let mut hl = 0.0;

            for pair in sorted.windows(2) {
                let (current, next) = (pair[0], pair[1]);
                gl += self.grad[current];
                hl += 1.0;

                let (lo, hi) = (self.rows[current][feature], self.rows[next][feature]);
                let hr = h - hl;
                if lo >= hi
                    || hl < self.params.min_child_weight
                    || hr < self.params.min_child_weight
                {
                    continue;
                }

                let gain = 0.5 * (self.score(gl, hl) + self.score(g - gl, hr) - parent);
                if gain > best.map_or(1e-12, |(_, _, b)| b) {
                    best = Some((feature, midpoint(lo, hi), gain));
                }
            }
        }

        let Some((feature, threshold, _)) = best else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.rows[s][feature] <= threshold);

        let left_id = self.grow(left, depth + 1);
        let right_id = self.grow(right, depth + 1);
        self.tree.set_split(id, feature, threshold, left_id, right_id);
        id
    }
}
