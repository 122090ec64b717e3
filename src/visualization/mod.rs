//! Renderer-agnostic chart descriptions attached to reports.
//!
//! A [`Visualization`] is a titled list of panels; each panel carries only the data a
//! front-end needs to draw it. Nothing here renders.


use serde::{Deserialize, Serialize};

/// Titled collection of chart panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub title: String,
    pub panels: Vec<ChartPanel>,
}

impl Visualization {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            panels: Vec::new(),
        }
    }

    pub fn with_panel(mut self, panel: ChartPanel) -> Self {
        self.panels.push(panel);
        self
    }
}

/// One labelled point of a scatter panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Series or cluster the point belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A single chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartPanel {
    Bar {
        title: String,
        labels: Vec<String>,
        values: Vec<f64>,
        /// Index of an emphasised bar.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight: Option<usize>,
    },
    Scatter {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<Point>,
        /// Point drawn on top with a distinct marker.
        #[serde(skip_serializing_if = "Option::is_none")]
        highlight: Option<Point>,
    },
    Histogram {
        title: String,
        /// `bins + 1` ascending edges.
        edges: Vec<f64>,
        counts: Vec<usize>,
    },
    Metric {
        title: String,
        value: f64,
        /// Inclusive display range, e.g. `[0, 1]` for accuracy.
        range: [f64; 2],
    },
    Line {
        title: String,
        x_label: String,
        y_label: String,
        series: Vec<Series>,
    },
}

/// Named polyline of a line panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Equal-width histogram over `values`. Empty input gives no bins.
pub fn histogram(title: impl Into<String>, values: &[f64], bins: usize) -> ChartPanel {
    let title = title.into();
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    if finite.is_empty() || bins == 0 {
        return ChartPanel::Histogram {
            title,
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for v in finite {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    ChartPanel::Histogram {
        title,
        edges,
        counts,
    }
}
