use tracing::debug;

use super::report::{AnalysisReport, ScoredGame, ScorerReport};
use super::{AnalysisError, AnalysisKind, Analyzer};
use crate::constants::{
    DEFAULT_SEED, DEFAULT_TEST_FRACTION, MIN_MODELING_ROWS, MIN_REVIEWS_FOR_MODELING,
    TOP_GAMES_SAMPLE,
};
use crate::features::{DerivedFeatures, FeaturedGame};
use crate::ml::{
    BoostingParams, GradientBoostingRegressor, mean_absolute_error, mean_squared_error, r2_score,
    shuffle_split,
};
use crate::visualization::{ChartPanel, Point, Series, Visualization, histogram};

const MODEL_NAME: &str = "XGBoost Regression";
const HISTOGRAM_BINS: usize = 30;

/// Relevance scorer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    pub min_reviews: f64,
    pub min_rows: usize,
    pub boosting: BoostingParams,
    pub test_fraction: f64,
    /// Seed of the train/test shuffle.
    pub split_seed: u64,
    pub top_n: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            min_reviews: MIN_REVIEWS_FOR_MODELING,
            min_rows: MIN_MODELING_ROWS,
            boosting: BoostingParams {
                seed: DEFAULT_SEED,
                ..BoostingParams::default()
            },
            test_fraction: DEFAULT_TEST_FRACTION,
            split_seed: DEFAULT_SEED,
            top_n: TOP_GAMES_SAMPLE,
        }
    }
}

impl ScorerConfig {
    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.boosting.n_estimators = n_estimators;
        self
    }
}

/// Heuristic relevance in `[0, 100]`: positive share scaled by log-dampened volume.
///
/// `clip(positive / total * 100 * ln(1 + total) / 10, 0, 100)`, or `0` without reviews.
pub fn relevance_heuristic(features: &DerivedFeatures) -> f64 {
    let total = features.total_reviews;
    if total <= 0.0 {
        return 0.0;
    }
    let raw = features.positive / total * 100.0 * total.ln_1p() / 10.0;
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) }
}

/// Learns the relevance heuristic from review volumes.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: ScorerConfig,
}

impl RelevanceScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    fn score(&self, games: &[FeaturedGame]) -> Result<ScorerReport, AnalysisError> {
        let cfg = &self.config;

        let kept: Vec<&FeaturedGame> = games
            .iter()
            .filter(|g| g.features.total_reviews >= cfg.min_reviews)
            .collect();

        if kept.len() < cfg.min_rows {
            return Err(AnalysisError::insufficient(format!(
                "need at least {} games with {} or more reviews, found {}",
                cfg.min_rows,
                cfg.min_reviews,
                kept.len()
            )));
        }

        let rows: Vec<Vec<f64>> = kept
            .iter()
            .map(|g| g.features.volume_vector().to_vec())
            .collect();
        let targets: Vec<f64> = kept
            .iter()
            .map(|g| relevance_heuristic(&g.features))
            .collect();

        let split = shuffle_split(kept.len(), cfg.test_fraction, cfg.split_seed);
        let train_rows: Vec<Vec<f64>> = split.train.iter().map(|&i| rows[i].clone()).collect();
        let train_targets: Vec<f64> = split.train.iter().map(|&i| targets[i]).collect();
        let test_rows: Vec<Vec<f64>> = split.test.iter().map(|&i| rows[i].clone()).collect();
        let test_targets: Vec<f64> = split.test.iter().map(|&i| targets[i]).collect();

        let mut model = GradientBoostingRegressor::new(cfg.boosting);
        model.fit(&train_rows, &train_targets)?;

        let test_predicted = model.predict_many(&test_rows);
        let r2 = r2_score(&test_targets, &test_predicted);
        let mse = mean_squared_error(&test_targets, &test_predicted);
        let mae = mean_absolute_error(&test_targets, &test_predicted);

        debug!(games = kept.len(), r2, mse, mae, "Relevance scorer fitted");

        let predicted = model.predict_many(&rows);
        let mut ranked: Vec<usize> = (0..kept.len()).collect();
        ranked.sort_by(|&a, &b| predicted[b].total_cmp(&predicted[a]));

        let top_games = ranked
            .iter()
            .take(cfg.top_n)
            .map(|&i| {
                let g = kept[i];
                ScoredGame {
                    id: g.record.id.clone(),
                    name: g.record.name.clone(),
                    developer: g.features.developer.clone(),
                    positive: g.features.positive,
                    negative: g.features.negative,
                    relevance_score: targets[i],
                    predicted_score: predicted[i],
                }
            })
            .collect();

        let visualization = scorer_chart(&test_targets, &test_predicted, &predicted, r2);

        Ok(ScorerReport {
            model: MODEL_NAME.to_string(),
            r2_score: r2,
            mse,
            mae,
            total_games_analyzed: kept.len(),
            top_games,
            visualization,
        })
    }
}

fn scorer_chart(
    truth: &[f64],
    test_predicted: &[f64],
    all_predicted: &[f64],
    r2: f64,
) -> Visualization {
    let lo = truth.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = truth.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Visualization::new("Relevance score regression")
        .with_panel(ChartPanel::Scatter {
            title: format!("Predicted vs actual (R² = {:.3})", r2),
            x_label: "Actual score".to_string(),
            y_label: "Predicted score".to_string(),
            points: truth
                .iter()
                .zip(test_predicted)
                .map(|(&x, &y)| Point {
                    x,
                    y,
                    group: None,
                    label: None,
                })
                .collect(),
            highlight: None,
        })
        .with_panel(ChartPanel::Line {
            title: "Identity".to_string(),
            x_label: "Actual score".to_string(),
            y_label: "Predicted score".to_string(),
            series: vec![Series {
                name: "y = x".to_string(),
                x: vec![lo, hi],
                y: vec![lo, hi],
            }],
        })
        .with_panel(histogram(
            "Predicted relevance distribution",
            all_predicted,
            HISTOGRAM_BINS,
        ))
}

impl Analyzer for RelevanceScorer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::XGBoost
    }

    fn analyze(&self, games: &[FeaturedGame]) -> Result<AnalysisReport, AnalysisError> {
        self.score(games).map(AnalysisReport::Scorer)
    }
}
