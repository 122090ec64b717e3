//! Small, seeded learners used by the analyzers.
//!
//! Everything here is CPU-bound and synchronous; callers run it on the blocking pool.
//! All randomness comes from [`rand::rngs::StdRng`] seeded per fit, so identical inputs
//! give identical models.

pub mod boosting;
mod error;
pub mod forest;
pub mod kmeans;
pub mod metrics;
pub mod scaler;
pub mod split;
pub mod tree;


pub use boosting::{BoostingParams, GradientBoostingRegressor};
pub use error::MlError;
pub use forest::RandomForestClassifier;
pub use kmeans::{KMeans, KMeansFit};
pub use metrics::{accuracy, mean_absolute_error, mean_squared_error, r2_score};
pub use scaler::StandardScaler;
pub use split::{Split, shuffle_split, split_with_fallback, stratified_split, test_count};
