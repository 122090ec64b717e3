//! Descriptive statistics over one numeric catalog field, with an EDF vs normal-CDF chart.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use statrs::distribution::{ContinuousCDF, Normal};

use super::AnalysisError;
use crate::store::GameRecord;
use crate::visualization::{ChartPanel, Series, Visualization};

/// Most points drawn per chart series.
const MAX_CHART_POINTS: usize = 500;

/// Fields the statistics endpoint can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatVariable {
    #[default]
    Positive,
    Negative,
    AveragePlaytime,
    MedianPlaytime,
    Price,
}

impl StatVariable {
    pub const ALL: [StatVariable; 5] = [
        Self::Positive,
        Self::Negative,
        Self::AveragePlaytime,
        Self::MedianPlaytime,
        Self::Price,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::AveragePlaytime => "average_playtime",
            Self::MedianPlaytime => "median_playtime",
            Self::Price => "price",
        }
    }
}

impl fmt::Display for StatVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatVariable {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| AnalysisError::UnknownVariable {
                name: s.to_string(),
                expected: Self::ALL.map(|v| v.as_str()).join(", "),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub variable: StatVariable,
    pub stats: DistributionSummary,
    pub visualization: Visualization,
}

/// Values of `variable` that are JSON numbers `>= 0`. Strings do not count.
pub fn collect_values(variable: StatVariable, records: &[GameRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| match r.field(variable.as_str()) {
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        })
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect()
}

/// Summary of sorted, non-empty values.
fn summarize(sorted: &[f64]) -> DistributionSummary {
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    DistributionSummary {
        mean,
        median,
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[n - 1],
        count: n,
    }
}

/// Normal CDF at `x`; a degenerate distribution is a step at the mean.
pub fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev).ok().filter(|_| std_dev > 0.0) {
        Some(normal) => normal.cdf(x),
        None if x >= mean => 1.0,
        None => 0.0,
    }
}

/// Evenly spaced indices into `0..n`, at most `max` of them, including both ends.
fn sample_indices(n: usize, max: usize) -> Vec<usize> {
    if n <= max || max < 2 {
        return (0..n).collect();
    }
    (0..max).map(|i| i * (n - 1) / (max - 1)).collect()
}

/// Describes `variable` over `records`; no qualifying value is [`AnalysisError::NoData`].
pub fn describe(
    variable: StatVariable,
    records: &[GameRecord],
) -> Result<StatisticsReport, AnalysisError> {
    let mut values = collect_values(variable, records);
    if values.is_empty() {
        return Err(AnalysisError::NoData);
    }
    values.sort_by(f64::total_cmp);

    let stats = summarize(&values);
    let n = values.len();

    let picked = sample_indices(n, MAX_CHART_POINTS);
    let x: Vec<f64> = picked.iter().map(|&i| values[i]).collect();
    let edf: Vec<f64> = picked.iter().map(|&i| (i + 1) as f64 / n as f64).collect();
    let cdf: Vec<f64> = x
        .iter()
        .map(|&v| normal_cdf(v, stats.mean, stats.std_dev))
        .collect();

    let visualization = Visualization::new(format!(
        "Empirical vs normal distribution of \"{}\"",
        variable
    ))
    .with_panel(ChartPanel::Line {
        title: "Cumulative probability".to_string(),
        x_label: variable.to_string(),
        y_label: "Cumulative probability".to_string(),
        series: vec![
            Series {
                name: "EDF (empirical)".to_string(),
                x: x.clone(),
                y: edf,
            },
            Series {
                name: "CDF (normal)".to_string(),
                x,
                y: cdf,
            },
        ],
    });

    Ok(StatisticsReport {
        variable,
        stats,
        visualization,
    })
}
