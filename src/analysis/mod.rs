//! Analysis pipeline: retrieve, derive features, fit, report.
//!
//! The three algorithms share the [`Analyzer`] capability. [`AnalysisSuite`] holds one of
//! each with its config; [`run`] and [`run_all`] do the glue (empty retrieval is
//! [`AnalysisError::NoData`], fitting happens on the blocking pool).
//!
//! | kind | analyzer | minimum data |
//! |------|----------|--------------|
//! | `random_forest` | [`DeveloperClassifier`] | 10 games from developers with 3+ games |
//! | `xgboost` | [`RelevanceScorer`] | 50 games with 10+ reviews |
//! | `kmeans` | [`ThematicClusterer`] | 50 games with 10+ reviews |

pub mod classifier;
pub mod clusterer;
mod error;
pub mod report;
pub mod scorer;
pub mod statistics;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

pub use classifier::{ClassifierConfig, DeveloperClassifier, select_top_developers};
pub use clusterer::{ClustererConfig, ThematicClusterer, elbow_range};
pub use error::AnalysisError;
pub use report::{AnalysisReport, ClassifierReport, ClustererReport, ScorerReport};
pub use scorer::{RelevanceScorer, ScorerConfig, relevance_heuristic};
pub use statistics::{StatVariable, StatisticsReport, describe};

use crate::features::{self, FeaturedGame};
use crate::store::GameRecord;

/// One fit-and-report algorithm over featured games.
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalysisKind;

    /// Runs on the full candidate set, in retrieval order.
    fn analyze(&self, games: &[FeaturedGame]) -> Result<AnalysisReport, AnalysisError>;
}

/// Selects an analyzer; the serialized form is the public algorithm key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnalysisKind {
    #[serde(rename = "random_forest")]
    RandomForest,
    #[serde(rename = "xgboost")]
    XGBoost,
    #[serde(rename = "kmeans")]
    KMeans,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [Self::RandomForest, Self::XGBoost, Self::KMeans];

    pub fn key(&self) -> &'static str {
        match self {
            Self::RandomForest => "random_forest",
            Self::XGBoost => "xgboost",
            Self::KMeans => "kmeans",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| format!("unknown analysis '{}'", s))
    }
}

/// One configured instance of each analyzer.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSuite {
    pub classifier: DeveloperClassifier,
    pub scorer: RelevanceScorer,
    pub clusterer: ThematicClusterer,
}

impl AnalysisSuite {
    pub fn new(
        classifier: ClassifierConfig,
        scorer: ScorerConfig,
        clusterer: ClustererConfig,
    ) -> Self {
        Self {
            classifier: DeveloperClassifier::new(classifier),
            scorer: RelevanceScorer::new(scorer),
            clusterer: ThematicClusterer::new(clusterer),
        }
    }

    pub fn get(&self, kind: AnalysisKind) -> &dyn Analyzer {
        match kind {
            AnalysisKind::RandomForest => &self.classifier,
            AnalysisKind::XGBoost => &self.scorer,
            AnalysisKind::KMeans => &self.clusterer,
        }
    }
}

/// Per-algorithm outcomes of [`run_all`], in [`AnalysisKind::ALL`] order.
pub type AllOutcomes = Vec<(AnalysisKind, Result<AnalysisReport, AnalysisError>)>;

fn join_failed(e: tokio::task::JoinError) -> AnalysisError {
    AnalysisError::Internal {
        reason: e.to_string(),
    }
}

/// Derives features and runs one analyzer on the blocking pool.
#[instrument(skip(suite, records), fields(count = records.len()))]
pub async fn run(
    suite: Arc<AnalysisSuite>,
    kind: AnalysisKind,
    records: Vec<GameRecord>,
) -> Result<AnalysisReport, AnalysisError> {
    if records.is_empty() {
        return Err(AnalysisError::NoData);
    }

    let report = tokio::task::spawn_blocking(move || {
        let games = features::build(records);
        suite.get(kind).analyze(&games)
    })
    .await
    .map_err(join_failed)??;

    info!(model = report.model(), "Analysis complete");
    Ok(report)
}

/// Runs every analyzer on the same candidate set. One failure does not stop the others.
#[instrument(skip(suite, records), fields(count = records.len()))]
pub async fn run_all(
    suite: Arc<AnalysisSuite>,
    records: Vec<GameRecord>,
) -> Result<AllOutcomes, AnalysisError> {
    if records.is_empty() {
        return Ok(AnalysisKind::ALL
            .into_iter()
            .map(|kind| (kind, Err(AnalysisError::NoData)))
            .collect());
    }

    tokio::task::spawn_blocking(move || {
        let games = features::build(records);
        AnalysisKind::ALL
            .into_iter()
            .map(|kind| (kind, suite.get(kind).analyze(&games)))
            .collect::<AllOutcomes>()
    })
    .await
    .map_err(join_failed)
}
