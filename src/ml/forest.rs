use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{MlError, check_rows, check_targets};
use super::tree::{ClassificationTree, TreeParams};

/// Bagged ensemble of CART classifiers.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    n_estimators: usize,
    max_depth: usize,
    balanced: bool,
    seed: u64,
    n_classes: usize,
    trees: Vec<ClassificationTree>,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize, max_depth: usize, seed: u64) -> Self {
        Self {
            n_estimators: n_estimators.max(1),
            max_depth,
            balanced: false,
            seed,
            n_classes: 0,
            trees: Vec::new(),
        }
    }

    /// Weighs classes by `n / (present_classes * count)` over the training rows.
    pub fn balanced(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fits on dense labels `0..n_classes`.
    pub fn fit(
        &mut self,
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<(), MlError> {
        let width = check_rows(rows)?;
        check_targets(rows.len(), labels.len())?;
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(MlError::DimensionMismatch {
                expected: n_classes,
                actual: bad + 1,
            });
        }

        let class_weights = self.class_weights(labels, n_classes);
        let params = TreeParams {
            max_depth: self.max_depth,
            max_features: ((width as f64).sqrt() as usize).max(1),
            min_samples_split: 2,
        };

        let n = rows.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree_rng = StdRng::seed_from_u64(rng.r#gen::<u64>());
                ClassificationTree::fit(
                    rows,
                    labels,
                    &class_weights,
                    n_classes,
                    bootstrap,
                    params,
                    &mut tree_rng,
                )
            })
            .collect();
        self.n_classes = n_classes;

        Ok(())
    }

    fn class_weights(&self, labels: &[usize], n_classes: usize) -> Vec<f64> {
        let mut counts = vec![0usize; n_classes];
        for &l in labels {
            counts[l] += 1;
        }

        if !self.balanced {
            return counts.iter().map(|&c| if c > 0 { 1.0 } else { 0.0 }).collect();
        }

        let present = counts.iter().filter(|&&c| c > 0).count() as f64;
        let n = labels.len() as f64;
        counts
            .iter()
            .map(|&c| if c > 0 { n / (present * c as f64) } else { 0.0 })
            .collect()
    }

    /// Mean of the per-tree leaf probabilities.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, MlError> {
        if self.trees.is_empty() {
            return Err(MlError::NotFitted);
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }

    /// Most probable label; ties go to the lowest label.
    pub fn predict(&self, row: &[f64]) -> Result<usize, MlError> {
        let proba = self.predict_proba(row)?;
        let mut best = 0;
        for (label, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = label;
            }
        }
        Ok(best)
    }

    pub fn predict_many(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, MlError> {
        rows.iter().map(|r| self.predict(r)).collect()
    }
}
