use serde::Serialize;

use crate::features::FeaturedGame;
use crate::visualization::Visualization;

/// Output of one analyzer. Serialized without a variant tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Classifier(ClassifierReport),
    Scorer(ScorerReport),
    Clusterer(ClustererReport),
}

impl AnalysisReport {
    pub fn model(&self) -> &str {
        match self {
            Self::Classifier(r) => &r.model,
            Self::Scorer(r) => &r.model,
            Self::Clusterer(r) => &r.model,
        }
    }

    pub fn visualization(&self) -> &Visualization {
        match self {
            Self::Classifier(r) => &r.visualization,
            Self::Scorer(r) => &r.visualization,
            Self::Clusterer(r) => &r.visualization,
        }
    }
}

/// Rounds to two decimals for report tables.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compact view of a game for report tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub id: String,
    pub name: String,
    pub developer: String,
    pub positive: f64,
    pub negative: f64,
    pub total_reviews: f64,
}

impl From<&FeaturedGame> for GameSummary {
    fn from(game: &FeaturedGame) -> Self {
        Self {
            id: game.record.id.clone(),
            name: game.record.name.clone(),
            developer: game.features.developer.clone(),
            positive: game.features.positive,
            negative: game.features.negative,
            total_reviews: game.features.total_reviews,
        }
    }
}

/// Mean engagement over a group of games.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMeans {
    pub mean_positive: f64,
    pub mean_negative: f64,
    pub mean_total_reviews: f64,
    pub mean_review_ratio: f64,
}

impl GroupMeans {
    /// Rounded means; an empty group is all zeros.
    pub fn of<'a>(games: impl IntoIterator<Item = &'a FeaturedGame>) -> Self {
        let mut sums = [0.0; 4];
        let mut n = 0usize;
        for g in games {
            for (s, v) in sums.iter_mut().zip(g.features.engagement_vector()) {
                *s += v;
            }
            n += 1;
        }
        if n == 0 {
            return Self::default();
        }
        let mean = |i: usize| round2(sums[i] / n as f64);
        Self {
            mean_positive: mean(0),
            mean_negative: mean(1),
            mean_total_reviews: mean(2),
            mean_review_ratio: mean(3),
        }
    }
}

// Classifier

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperCount {
    pub developer: String,
    pub games: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperStats {
    pub developer: String,
    pub games: usize,
    #[serde(flatten)]
    pub means: GroupMeans,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperPrediction {
    pub id: String,
    pub name: String,
    pub developer: String,
    pub predicted_developer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierReport {
    pub model: String,
    /// Accuracy on the held-out split.
    pub accuracy: f64,
    pub developers_found: usize,
    /// Games in the working set (top developers only).
    pub total_games: usize,
    /// Games retrieved.
    pub total_games_all: usize,
    /// Whether the class-preserving split was used.
    pub stratified: bool,
    pub top_developers: Vec<DeveloperCount>,
    pub developer_stats: Vec<DeveloperStats>,
    pub games_by_developer: Vec<GameSummary>,
    pub predictions: Vec<DeveloperPrediction>,
    pub visualization: Visualization,
}

// Scorer

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGame {
    pub id: String,
    pub name: String,
    pub developer: String,
    pub positive: f64,
    pub negative: f64,
    pub relevance_score: f64,
    pub predicted_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorerReport {
    pub model: String,
    pub r2_score: f64,
    pub mse: f64,
    pub mae: f64,
    pub total_games_analyzed: usize,
    pub top_games: Vec<ScoredGame>,
    pub visualization: Visualization,
}

// Clusterer

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterStats {
    pub cluster: usize,
    pub games: usize,
    #[serde(flatten)]
    pub means: GroupMeans,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterPeer {
    pub id: String,
    pub name: String,
    pub developer: String,
    pub positive: f64,
    pub negative: f64,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElbowPoint {
    pub k: usize,
    pub inertia: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClustererReport {
    pub model: String,
    pub n_clusters: usize,
    /// Name of the first retrieved game.
    pub reference_game: String,
    pub reference_id: String,
    pub reference_cluster: usize,
    /// `false` when the reference had too few reviews and was placed by nearest centroid.
    pub reference_in_analyzed_set: bool,
    pub cluster_stats: Vec<ClusterStats>,
    pub cluster_games: Vec<ClusterPeer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elbow_curve: Option<Vec<ElbowPoint>>,
    pub total_games_analyzed: usize,
    /// Cluster of every analyzed game, in retrieval order.
    #[serde(skip)]
    pub assignments: Vec<(String, usize)>,
    pub visualization: Visualization,
}
