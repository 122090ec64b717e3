use std::collections::HashMap;

use tracing::debug;

use super::report::{
    AnalysisReport, ClassifierReport, DeveloperCount, DeveloperPrediction, DeveloperStats,
    GameSummary, GroupMeans,
};
use super::{AnalysisError, AnalysisKind, Analyzer};
use crate::constants::{
    DEFAULT_SEED, DEFAULT_TEST_FRACTION, MAX_TOP_DEVELOPERS, MIN_CLASSIFIER_ROWS,
    MIN_GAMES_PER_DEVELOPER,
};
use crate::features::FeaturedGame;
use crate::ml::{RandomForestClassifier, accuracy, split_with_fallback};
use crate::visualization::{ChartPanel, Visualization};

const MODEL_NAME: &str = "Random Forest - Developer Classification";

/// Developer classifier settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum games overall and after developer filtering.
    pub min_rows: usize,
    pub min_games_per_developer: usize,
    pub max_developers: usize,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub balanced: bool,
    pub test_fraction: f64,
    pub seed: u64,
    /// Developers shown in `games_by_developer`.
    pub sample_developers: usize,
    /// Games per developer shown in `games_by_developer`.
    pub sample_games: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_rows: MIN_CLASSIFIER_ROWS,
            min_games_per_developer: MIN_GAMES_PER_DEVELOPER,
            max_developers: MAX_TOP_DEVELOPERS,
            n_estimators: 100,
            max_depth: 15,
            balanced: true,
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            sample_developers: 5,
            sample_games: 3,
        }
    }
}

impl ClassifierConfig {
    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Most frequent developers with at least `min_games` games, at most `max` of them.
///
/// Ordered by game count, descending; equal counts keep first-appearance order.
pub fn select_top_developers(
    games: &[FeaturedGame],
    min_games: usize,
    max: usize,
) -> Vec<DeveloperCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for g in games {
        let dev = g.features.developer.as_str();
        let count = counts.entry(dev).or_insert(0);
        if *count == 0 {
            order.push(dev);
        }
        *count += 1;
    }

    let mut ranked: Vec<DeveloperCount> = order
        .into_iter()
        .map(|dev| DeveloperCount {
            developer: dev.to_string(),
            games: counts[dev],
        })
        .filter(|d| d.games >= min_games)
        .collect();
    ranked.sort_by(|a, b| b.games.cmp(&a.games));
    ranked.truncate(max);
    ranked
}

/// Predicts a game's developer from its engagement features.
#[derive(Debug, Clone, Default)]
pub struct DeveloperClassifier {
    config: ClassifierConfig,
}

impl DeveloperClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn classify(&self, games: &[FeaturedGame]) -> Result<ClassifierReport, AnalysisError> {
        let cfg = &self.config;

        if games.len() < cfg.min_rows {
            return Err(AnalysisError::insufficient(format!(
                "need at least {} games, found {}",
                cfg.min_rows,
                games.len()
            )));
        }

        let top = select_top_developers(games, cfg.min_games_per_developer, cfg.max_developers);
        if top.is_empty() {
            return Err(AnalysisError::insufficient_developers(
                format!(
                    "no developer has at least {} games",
                    cfg.min_games_per_developer
                ),
                0,
            ));
        }

        // Dense labels in alphabetical order of developer name.
        let mut names: Vec<&str> = top.iter().map(|d| d.developer.as_str()).collect();
        names.sort_unstable();
        let label_of: HashMap<&str, usize> =
            names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let working: Vec<&FeaturedGame> = games
            .iter()
            .filter(|g| label_of.contains_key(g.features.developer.as_str()))
            .collect();

        if working.len() < cfg.min_rows {
            return Err(AnalysisError::insufficient_developers(
                format!(
                    "found {} games across {} developers with at least {} games (minimum {})",
                    working.len(),
                    top.len(),
                    cfg.min_games_per_developer,
                    cfg.min_rows
                ),
                top.len(),
            ));
        }

        let rows: Vec<Vec<f64>> = working
            .iter()
            .map(|g| g.features.engagement_vector().to_vec())
            .collect();
        let labels: Vec<usize> = working
            .iter()
            .map(|g| label_of[g.features.developer.as_str()])
            .collect();

        let split = split_with_fallback(&labels, names.len(), cfg.test_fraction, cfg.seed);
        let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
            idx.iter().map(|&i| (rows[i].clone(), labels[i])).unzip()
        };
        let (train_rows, train_labels) = pick(&split.train);
        let (test_rows, test_labels) = pick(&split.test);

        let mut forest = RandomForestClassifier::new(cfg.n_estimators, cfg.max_depth, cfg.seed)
            .balanced(cfg.balanced);
        forest.fit(&train_rows, &train_labels, names.len())?;

        let test_accuracy = accuracy(&test_labels, &forest.predict_many(&test_rows)?);
        let predicted = forest.predict_many(&rows)?;

        debug!(
            developers = names.len(),
            games = working.len(),
            stratified = split.stratified,
            accuracy = test_accuracy,
            "Developer classifier fitted"
        );

        let predictions = working
            .iter()
            .zip(&predicted)
            .map(|(g, &p)| DeveloperPrediction {
                id: g.record.id.clone(),
                name: g.record.name.clone(),
                developer: g.features.developer.clone(),
                predicted_developer: names[p].to_string(),
            })
            .collect();

        let mut developer_stats: Vec<DeveloperStats> = top
            .iter()
            .map(|d| DeveloperStats {
                developer: d.developer.clone(),
                games: d.games,
                means: GroupMeans::of(
                    working
                        .iter()
                        .copied()
                        .filter(|g| g.features.developer == d.developer),
                ),
            })
            .collect();
        developer_stats.sort_by(|a, b| {
            b.games
                .cmp(&a.games)
                .then_with(|| a.developer.cmp(&b.developer))
        });

        let games_by_developer = top
            .iter()
            .take(cfg.sample_developers)
            .flat_map(|d| {
                let mut own: Vec<&FeaturedGame> = working
                    .iter()
                    .copied()
                    .filter(|g| g.features.developer == d.developer)
                    .collect();
                own.sort_by(|a, b| {
                    b.features
                        .total_reviews
                        .total_cmp(&a.features.total_reviews)
                });
                own.into_iter()
                    .take(cfg.sample_games)
                    .map(GameSummary::from)
                    .collect::<Vec<_>>()
            })
            .collect();

        let visualization = Visualization::new("Developer classification")
            .with_panel(ChartPanel::Bar {
                title: "Top developers by game count".to_string(),
                labels: developer_stats
                    .iter()
                    .take(cfg.max_developers)
                    .map(|d| d.developer.clone())
                    .collect(),
                values: developer_stats
                    .iter()
                    .take(cfg.max_developers)
                    .map(|d| d.games as f64)
                    .collect(),
                highlight: None,
            })
            .with_panel(ChartPanel::Metric {
                title: format!("Overall accuracy ({} developers)", names.len()),
                value: test_accuracy,
                range: [0.0, 1.0],
            });

        Ok(ClassifierReport {
            model: MODEL_NAME.to_string(),
            accuracy: test_accuracy,
            developers_found: top.len(),
            total_games: working.len(),
            total_games_all: games.len(),
            stratified: split.stratified,
            top_developers: top,
            developer_stats,
            games_by_developer,
            predictions,
            visualization,
        })
    }
}

impl Analyzer for DeveloperClassifier {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::RandomForest
    }

    fn analyze(&self, games: &[FeaturedGame]) -> Result<AnalysisReport, AnalysisError> {
        self.classify(games).map(AnalysisReport::Classifier)
    }
}
