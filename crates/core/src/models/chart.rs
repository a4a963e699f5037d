use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of chart a frontend should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Line,
    Pie,
    Bar,
    Scatter,
}

/// Color scheme for chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Plotly,
    Pastel,
    Bold,
}

/// Display options applied to a chart, chosen once from user preferences.
/// Never affects the numbers, only how they are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    pub color_scheme: ColorScheme,
    pub show_grid: bool,
    pub show_legend: bool,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Plotly,
            show_grid: true,
            show_legend: true,
        }
    }
}

/// The data payload of a chart, shaped per chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
    /// Value over time (portfolio value, single-ticker performance)
    Line {
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    },
    /// Share per label (allocation percentages)
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    /// Value per label (position values)
    Bar {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    /// Labeled (x, y) points (risk vs return)
    Scatter {
        labels: Vec<String>,
        x: Vec<f64>,
        y: Vec<f64>,
    },
}

impl ChartData {
    #[must_use]
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartData::Line { .. } => ChartKind::Line,
            ChartData::Pie { .. } => ChartKind::Pie,
            ChartData::Bar { .. } => ChartKind::Bar,
            ChartData::Scatter { .. } => ChartKind::Scatter,
        }
    }
}

/// A complete, renderable chart description.
///
/// The core computes all the numbers — the frontend only renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub data: ChartData,
    pub theme: ChartTheme,
}
