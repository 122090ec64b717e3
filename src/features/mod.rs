//! Feature builder: raw catalog fields to model-ready numbers.
//!
//! Pure and deterministic. Every retrieved [`GameRecord`] gets a [`DerivedFeatures`]
//! with coerced review counts, `total_reviews`, `review_ratio` and a normalized developer.

#[cfg(test)]
mod tests;

use serde_json::Value;

use crate::constants::UNKNOWN_DEVELOPER;
use crate::store::GameRecord;

/// Engagement features derived from one record.
///
/// Invariants: `total_reviews == positive + negative`, `total_reviews >= 0`,
/// `review_ratio` in `[0, 1]` and `0` whenever `total_reviews == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFeatures {
    /// Trimmed developer name, or `"Unknown"`.
    pub developer: String,
    pub positive: f64,
    pub negative: f64,
    pub total_reviews: f64,
    pub review_ratio: f64,
}

impl DerivedFeatures {
    pub fn derive(record: &GameRecord) -> Self {
        let positive = coerce_count(&record.positive);
        let negative = coerce_count(&record.negative);
        let total_reviews = positive + negative;
        let review_ratio = if total_reviews > 0.0 {
            positive / total_reviews
        } else {
            0.0
        };

        Self {
            developer: normalize_developer(&record.developer),
            positive,
            negative,
            total_reviews,
            review_ratio,
        }
    }

    /// `[positive, negative, total_reviews, review_ratio]`
    pub fn engagement_vector(&self) -> [f64; 4] {
        [
            self.positive,
            self.negative,
            self.total_reviews,
            self.review_ratio,
        ]
    }

    /// `[positive, negative, total_reviews]`
    pub fn volume_vector(&self) -> [f64; 3] {
        [self.positive, self.negative, self.total_reviews]
    }
}

/// A retrieved record together with its derived features.
#[derive(Debug, Clone)]
pub struct FeaturedGame {
    pub record: GameRecord,
    pub features: DerivedFeatures,
}

impl FeaturedGame {
    pub fn new(record: GameRecord) -> Self {
        let features = DerivedFeatures::derive(&record);
        Self { record, features }
    }
}

/// Derives features for every record, preserving retrieval order.
pub fn build(records: Vec<GameRecord>) -> Vec<FeaturedGame> {
    records.into_iter().map(FeaturedGame::new).collect()
}

/// Interprets a raw value as a number: JSON numbers and numeric strings.
///
/// Returns `None` for anything else, including non-finite results.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Review-count coercion: unusable or negative values count as zero.
pub fn coerce_count(value: &Value) -> f64 {
    match numeric_value(value) {
        Some(n) if n > 0.0 => n,
        _ => 0.0,
    }
}

/// Trimmed developer string, or [`UNKNOWN_DEVELOPER`] when missing, blank or not a string.
pub fn normalize_developer(value: &Value) -> String {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => UNKNOWN_DEVELOPER.to_string(),
    }
}
