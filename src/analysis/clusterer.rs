use tracing::debug;

use super::report::{
    AnalysisReport, ClusterPeer, ClusterStats, ClustererReport, ElbowPoint, GroupMeans,
};
use super::{AnalysisError, AnalysisKind, Analyzer};
use crate::constants::{
    CLUSTER_PEER_SAMPLE, DEFAULT_CLUSTER_COUNT, DEFAULT_SEED, ELBOW_MAX_K, MIN_MODELING_ROWS,
    MIN_REVIEWS_FOR_MODELING,
};
use crate::features::FeaturedGame;
use crate::ml::{KMeans, KMeansFit, StandardScaler};
use crate::visualization::{ChartPanel, Point, Series, Visualization};

const MODEL_NAME: &str = "K-Means Clustering";

/// Thematic clusterer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClustererConfig {
    pub min_reviews: f64,
    pub min_rows: usize,
    pub n_clusters: usize,
    pub n_init: usize,
    pub seed: u64,
    /// Compute the informational elbow curve.
    pub elbow: bool,
    /// Exclusive upper bound of the elbow sweep (also capped at `n / 10`).
    pub elbow_max_k: usize,
    pub peer_sample: usize,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            min_reviews: MIN_REVIEWS_FOR_MODELING,
            min_rows: MIN_MODELING_ROWS,
            n_clusters: DEFAULT_CLUSTER_COUNT,
            n_init: 10,
            seed: DEFAULT_SEED,
            elbow: true,
            elbow_max_k: ELBOW_MAX_K,
            peer_sample: CLUSTER_PEER_SAMPLE,
        }
    }
}

impl ClustererConfig {
    pub fn with_elbow(mut self, elbow: bool) -> Self {
        self.elbow = elbow;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }
}

/// Candidate cluster counts of the elbow sweep: `[2, min(max_k, n / 10))`.
pub fn elbow_range(n: usize, max_k: usize) -> std::ops::Range<usize> {
    2..max_k.min(n / 10).max(2)
}

/// Groups games by engagement profile and reports the reference game's neighbours.
#[derive(Debug, Clone, Default)]
pub struct ThematicClusterer {
    config: ClustererConfig,
}

impl ThematicClusterer {
    pub fn new(config: ClustererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClustererConfig {
        &self.config
    }

    fn cluster(&self, games: &[FeaturedGame]) -> Result<ClustererReport, AnalysisError> {
        let cfg = &self.config;
        let reference = games.first().ok_or(AnalysisError::NoData)?;

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
            .map(|g| g.features.engagement_vector().to_vec())
            .collect();
        let (scaler, scaled) = StandardScaler::fit_transform(&rows)?;

        let elbow_curve = if cfg.elbow {
            let mut curve = Vec::new();
            for k in elbow_range(kept.len(), cfg.elbow_max_k) {
                let fit = KMeans::new(k, cfg.seed)
                    .with_n_init(cfg.n_init)
                    .fit(&scaled)?;
                curve.push(ElbowPoint {
                    k,
                    inertia: fit.inertia,
                });
            }
            Some(curve)
        } else {
            None
        };

        let fit = KMeans::new(cfg.n_clusters, cfg.seed)
            .with_n_init(cfg.n_init)
            .fit(&scaled)?;

        // The reference is the first retrieved game, before review filtering.
        let reference_in_set = reference.features.total_reviews >= cfg.min_reviews;
        let reference_cluster = if reference_in_set {
            fit.labels[0]
        } else {
            fit.predict(&scaler.transform_row(&reference.features.engagement_vector()))
        };

        debug!(
            games = kept.len(),
            inertia = fit.inertia,
            iterations = fit.n_iter,
            reference_cluster,
            reference_in_set,
            "Thematic clusterer fitted"
        );

        // First games of the reference cluster, the reference itself included.
        let cluster_games = kept
            .iter()
            .zip(&fit.labels)
            .filter(|(_, label)| **label == reference_cluster)
            .take(cfg.peer_sample)
            .map(|(g, &cluster)| ClusterPeer {
                id: g.record.id.clone(),
                name: g.record.name.clone(),
                developer: g.features.developer.clone(),
                positive: g.features.positive,
                negative: g.features.negative,
                cluster,
            })
            .collect();

        let cluster_stats: Vec<ClusterStats> = (0..cfg.n_clusters)
            .map(|c| {
                let members = kept
                    .iter()
                    .zip(&fit.labels)
                    .filter(|(_, l)| **l == c)
                    .map(|(g, _)| *g);
                let games = fit.labels.iter().filter(|&&l| l == c).count();
                ClusterStats {
                    cluster: c,
                    games,
                    means: GroupMeans::of(members),
                }
            })
            .collect();

        let visualization = cluster_chart(
            &kept,
            &fit,
            reference,
            reference_cluster,
            &cluster_stats,
            elbow_curve.as_deref(),
        );

        Ok(ClustererReport {
            model: MODEL_NAME.to_string(),
            n_clusters: cfg.n_clusters,
            reference_game: reference.record.name.clone(),
            reference_id: reference.record.id.clone(),
            reference_cluster,
            reference_in_analyzed_set: reference_in_set,
            cluster_stats,
            cluster_games,
            elbow_curve,
            total_games_analyzed: kept.len(),
            assignments: kept
                .iter()
                .zip(&fit.labels)
                .map(|(g, &l)| (g.record.id.clone(), l))
                .collect(),
            visualization,
        })
    }
}

fn cluster_chart(
    kept: &[&FeaturedGame],
    fit: &KMeansFit,
    reference: &FeaturedGame,
    reference_cluster: usize,
    stats: &[ClusterStats],
    elbow: Option<&[ElbowPoint]>,
) -> Visualization {
    let mut viz = Visualization::new("Thematic clustering")
        .with_panel(ChartPanel::Scatter {
            title: "Clusters (positive vs negative reviews)".to_string(),
            x_label: "Positive reviews".to_string(),
            y_label: "Negative reviews".to_string(),
            points: kept
                .iter()
                .zip(&fit.labels)
                .map(|(g, &l)| Point {
                    x: g.features.positive,
                    y: g.features.negative,
                    group: Some(l),
                    label: None,
                })
                .collect(),
            highlight: Some(Point {
                x: reference.features.positive,
                y: reference.features.negative,
                group: Some(reference_cluster),
                label: Some(format!("Reference: {}", reference.record.name)),
            }),
        })
        .with_panel(ChartPanel::Bar {
            title: "Games per cluster".to_string(),
            labels: stats.iter().map(|s| s.cluster.to_string()).collect(),
            values: stats.iter().map(|s| s.games as f64).collect(),
            highlight: Some(reference_cluster),
        });

    if let Some(curve) = elbow.filter(|c| !c.is_empty()) {
        viz = viz.with_panel(ChartPanel::Line {
            title: "Elbow curve".to_string(),
            x_label: "k".to_string(),
            y_label: "Inertia".to_string(),
            series: vec![Series {
                name: "inertia".to_string(),
                x: curve.iter().map(|p| p.k as f64).collect(),
                y: curve.iter().map(|p| p.inertia).collect(),
            }],
        });
    }

    viz
}

impl Analyzer for ThematicClusterer {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::KMeans
    }

    fn analyze(&self, games: &[FeaturedGame]) -> Result<AnalysisReport, AnalysisError> {
        self.cluster(games).map(AnalysisReport::Clusterer)
    }
}
