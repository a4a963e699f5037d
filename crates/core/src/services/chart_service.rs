use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::chart::{ChartData, ChartSpec, ChartTheme};
use crate::models::price::HistoricalSeries;
use crate::models::settings::ChartPreferences;

/// Turns analytics outputs into renderable chart specifications.
///
/// Every builder is a pure mapping from numeric series to a `ChartSpec` —
/// no computation beyond ordering and label formatting. Empty or
/// mismatched-length inputs are caller bugs and are rejected, never
/// silently coerced.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Line chart of portfolio value over time.
    pub fn portfolio_value_chart(
        &self,
        dates: &[NaiveDate],
        values: &[f64],
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        if dates.is_empty() || values.is_empty() {
            return Err(CoreError::ValidationError(
                "Dates and values must not be empty".into(),
            ));
        }
        if dates.len() != values.len() {
            return Err(CoreError::ValidationError(format!(
                "Dates ({}) and values ({}) must have the same length",
                dates.len(),
                values.len()
            )));
        }

        Ok(ChartSpec {
            title: title.to_string(),
            x_label: Some("Date".into()),
            y_label: Some("Value".into()),
            data: ChartData::Line {
                dates: dates.to_vec(),
                values: values.to_vec(),
            },
            theme: ChartTheme::default(),
        })
    }

    /// Pie chart of allocation percentages, slices sorted largest first.
    pub fn allocation_pie_chart(
        &self,
        allocation: &HashMap<String, f64>,
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        if allocation.is_empty() {
            return Err(CoreError::ValidationError(
                "Allocation must not be empty".into(),
            ));
        }

        let mut slices: Vec<(&String, &f64)> = allocation.iter().collect();
        slices.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(ChartSpec {
            title: title.to_string(),
            x_label: None,
            y_label: None,
            data: ChartData::Pie {
                labels: slices.iter().map(|(t, _)| (*t).clone()).collect(),
                values: slices.iter().map(|(_, v)| **v).collect(),
            },
            theme: ChartTheme::default(),
        })
    }

    /// Bar chart of per-position values, bars sorted largest first.
    pub fn position_values_bar_chart(
        &self,
        position_values: &HashMap<String, f64>,
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        if position_values.is_empty() {
            return Err(CoreError::ValidationError(
                "Position values must not be empty".into(),
            ));
        }

        let mut bars: Vec<(&String, &f64)> = position_values.iter().collect();
        bars.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(ChartSpec {
            title: title.to_string(),
            x_label: Some("Ticker".into()),
            y_label: Some("Value".into()),
            data: ChartData::Bar {
                labels: bars.iter().map(|(t, _)| (*t).clone()).collect(),
                values: bars.iter().map(|(_, v)| **v).collect(),
            },
            theme: ChartTheme::default(),
        })
    }

    /// Scatter plot of annualized return vs volatility per ticker.
    /// Inputs are decimals (0.15 = 15%) and are converted to percent for
    /// display.
    pub fn risk_return_scatter(
        &self,
        tickers: &[String],
        returns: &[f64],
        volatilities: &[f64],
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        if tickers.is_empty() || returns.is_empty() || volatilities.is_empty() {
            return Err(CoreError::ValidationError(
                "Tickers, returns, and volatilities must not be empty".into(),
            ));
        }
        if tickers.len() != returns.len() || tickers.len() != volatilities.len() {
            return Err(CoreError::ValidationError(format!(
                "Tickers ({}), returns ({}), and volatilities ({}) must have the same length",
                tickers.len(),
                returns.len(),
                volatilities.len()
            )));
        }

        Ok(ChartSpec {
            title: title.to_string(),
            x_label: Some("Volatility (%)".into()),
            y_label: Some("Return (%)".into()),
            data: ChartData::Scatter {
                labels: tickers.to_vec(),
                x: volatilities.iter().map(|v| v * 100.0).collect(),
                y: returns.iter().map(|r| r * 100.0).collect(),
            },
            theme: ChartTheme::default(),
        })
    }

    /// Line chart of one ticker's close-price history.
    pub fn performance_chart(
        &self,
        ticker: &str,
        series: &HistoricalSeries,
    ) -> Result<ChartSpec, CoreError> {
        if series.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Historical series for {ticker} must not be empty"
            )));
        }

        Ok(ChartSpec {
            title: format!("{ticker} Performance"),
            x_label: Some("Date".into()),
            y_label: Some("Price".into()),
            data: ChartData::Line {
                dates: series.iter().map(|p| p.date).collect(),
                values: series.iter().map(|p| p.price).collect(),
            },
            theme: ChartTheme::default(),
        })
    }

    /// Apply user chart preferences to a spec. Display only — the data is
    /// untouched.
    pub fn apply_theme(&self, spec: &mut ChartSpec, preferences: &ChartPreferences) {
        spec.theme = ChartTheme {
            color_scheme: preferences.color_scheme,
            show_grid: preferences.show_grid,
            show_legend: preferences.show_legend,
        };
        debug!(scheme = ?preferences.color_scheme, "applied chart theme");
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
