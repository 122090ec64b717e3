use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    /// Whether class proportions were preserved.
    pub stratified: bool,
}

/// Held-out rows for `n` samples: `ceil(fraction * n)`, leaving at least one training row.
pub fn test_count(n: usize, fraction: f64) -> usize {
    if n < 2 {
        return 0;
    }
    let wanted = (n as f64 * fraction).ceil() as usize;
    wanted.clamp(1, n - 1)
}

/// Seeded shuffle, then the first `test_count` rows become the test set.
pub fn shuffle_split(n: usize, fraction: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let n_test = test_count(n, fraction);
    let train = indices.split_off(n_test);

    Split {
        train,
        test: indices,
        stratified: false,
    }
}

/// Class-preserving split over dense labels `0..n_classes`.
///
/// Returns `None` when stratification cannot work: some class has fewer than two members,
/// or either side is too small to hold one row per class.
pub fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    fraction: f64,
    seed: u64,
) -> Option<Split> {
    let n = labels.len();
    if n_classes == 0 || labels.iter().any(|&l| l >= n_classes) {
        return None;
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
    }

    let n_test = test_count(n, fraction);
    if members.iter().any(|m| m.len() < 2) || n_test < n_classes || n - n_test < n_classes {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for mut class_rows in members {
        let count = class_rows.len();
        let held_out = ((count as f64 * fraction).round() as usize).clamp(1, count - 1);
        class_rows.shuffle(&mut rng);
        let rest = class_rows.split_off(held_out);
        test.extend(class_rows);
        train.extend(rest);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Some(Split {
        train,
        test,
        stratified: true,
    })
}

/// Stratified when feasible, otherwise a plain shuffled split with the same seed.
pub fn split_with_fallback(labels: &[usize], n_classes: usize, fraction: f64, seed: u64) -> Split {
    stratified_split(labels, n_classes, fraction, seed)
        .unwrap_or_else(|| shuffle_split(labels.len(), fraction, seed))
}
