//! Binary decision trees stored as flat node arenas.
//!
//! [`ClassificationTree`] is a weighted-Gini CART used by the random forest. The gradient
//! booster grows its own regression trees on the same [`Tree`] arena.

use rand::rngs::StdRng;
use rand::seq::index;

/// Split test: `row[feature] <= threshold` goes left.
#[derive(Debug, Clone)]
pub(crate) enum Node<L> {
    Leaf(L),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Tree<L> {
    nodes: Vec<Node<L>>,
}

impl<L> Tree<L> {
    pub(crate) fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Appends a leaf and returns its index.
    pub(crate) fn push_leaf(&mut self, value: L) -> usize {
        self.nodes.push(Node::Leaf(value));
        self.nodes.len() - 1
    }

    /// Turns node `id` into a split.
    pub(crate) fn set_split(
        &mut self,
        id: usize,
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    ) {
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Leaf reached by `row`. The tree must have a root.
    pub(crate) fn leaf(&self, row: &[f64]) -> &L {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Midpoint between two sorted distinct values, never rounding up onto `hi`.
pub(crate) fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi { lo } else { mid }
}

/// Samples sorted by one feature.
pub(crate) fn sorted_by_feature(
    rows: &[Vec<f64>],
    samples: &[usize],
    feature: usize,
) -> Vec<usize> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));
    sorted
}

/// Growth limits shared by tree learners.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// Root is depth 0; nodes at this depth are always leaves.
    pub max_depth: usize,
    /// Candidate features drawn per split.
    pub max_features: usize,
    pub min_samples_split: usize,
}

/// CART classifier over weighted samples; leaves hold class probabilities.
#[derive(Debug, Clone)]
pub struct ClassificationTree {
    tree: Tree<Vec<f64>>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct ClassGrower<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [usize],
    class_weights: &'a [f64],
    n_classes: usize,
    params: TreeParams,
    rng: &'a mut StdRng,
    tree: Tree<Vec<f64>>,
}

impl ClassificationTree {
    /// Grows a tree on `samples` (indices into `rows`, repeats allowed).
    ///
    /// Each occurrence of a sample weighs `class_weights[label]`.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        class_weights: &[f64],
        n_classes: usize,
        samples: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut grower = ClassGrower {
            rows,
            labels,
            class_weights,
            n_classes,
            params,
            rng,
            tree: Tree::new(),
        };
        grower.grow(samples, 0);
        Self { tree: grower.tree }
    }

    /// Class probabilities at the leaf reached by `row`.
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        self.tree.leaf(row)
    }

    pub fn node_count(&self) -> usize {
        self.tree.len()
    }
}

fn gini(weights: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - weights.iter().map(|w| (w / total).powi(2)).sum::<f64>()
}

impl ClassGrower<'_> {
    fn class_totals(&self, samples: &[usize]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for &s in samples {
            let label = self.labels[s];
            totals[label] += self.class_weights[label];
        }
        totals
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let totals = self.class_totals(&samples);
        let total: f64 = totals.iter().sum();
        let impurity = gini(&totals, total);

        let proba = if total > 0.0 {
            totals.iter().map(|w| w / total).collect()
        } else {
            vec![0.0; self.n_classes]
        };
        let id = self.tree.push_leaf(proba);

        if depth >= self.params.max_depth
            || samples.len() < self.params.min_samples_split
            || impurity <= 0.0
        {
            return id;
        }

        let Some(best) = self.best_split(&samples, &totals, total, impurity) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.rows[s][best.feature] <= best.threshold);

        let left_id = self.grow(left, depth + 1);
        let right_id = self.grow(right, depth + 1);
        self.tree
            .set_split(id, best.feature, best.threshold, left_id, right_id);
        id
    }

    fn best_split(
        &mut self,
        samples: &[usize],
        totals: &[f64],
        total: f64,
        impurity: f64,
    ) -> Option<BestSplit> {
        let n_features = self.rows.first().map(Vec::len).unwrap_or(0);
        let draw = self.params.max_features.clamp(1, n_features.max(1));
        if n_features == 0 {
            return None;
        }

        let mut best: Option<BestSplit> = None;

        for feature in index::sample(self.rng, n_features, draw).into_iter() {
            let sorted = sorted_by_feature(self.rows, samples, feature);
            let mut left = vec![0.0; self.n_classes];
            let mut left_total = 0.0;

            for pair in sorted.windows(2) {
                let (current, next) = (pair[0], pair[1]);
                let label = self.labels[current];
                let w = self.class_weights[label];
                left[label] += w;
                left_total += w;

                let (lo, hi) = (self.rows[current][feature], self.rows[next][feature]);
                if lo >= hi {
                    continue;
                }

                let right_total = total - left_total;
                let right: Vec<f64> = totals.iter().zip(&left).map(|(t, l)| t - l).collect();
                let child = (left_total * gini(&left, left_total)
                    + right_total * gini(&right, right_total))
                    / total;
                let gain = impurity - child;

                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: midpoint(lo, hi),
                        gain,
                    });
                }
            }
        }

        best
    }
}
