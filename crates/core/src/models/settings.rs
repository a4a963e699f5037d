use serde::{Deserialize, Serialize};

use super::chart::{ChartKind, ColorScheme};

/// An ETF suggested in the default portfolio, with its target weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfInfo {
    pub ticker: String,
    pub name: String,
    pub weight: f64,
}

impl EtfInfo {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            weight,
        }
    }
}

/// Chart display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPreferences {
    pub default_chart: ChartKind,
    pub color_scheme: ColorScheme,
    pub show_grid: bool,
    pub show_legend: bool,
}

impl Default for ChartPreferences {
    fn default() -> Self {
        Self {
            default_chart: ChartKind::Line,
            color_scheme: ColorScheme::Plotly,
            show_grid: true,
            show_legend: true,
        }
    }
}

/// User-configurable application settings.
///
/// Configuration only — nothing in here ever changes analytics results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency label for displayed values (e.g., "EUR")
    pub default_currency: String,

    /// Market data source identifier
    pub data_source: String,

    /// Whether the frontend should refresh prices on a timer
    pub auto_refresh_enabled: bool,

    /// Refresh timer interval, in minutes (always > 0)
    pub auto_refresh_interval_minutes: u32,

    /// PEA-eligible ETFs offered as a starting portfolio
    pub etfs: Vec<EtfInfo>,

    pub chart_preferences: ChartPreferences,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_currency: "EUR".to_string(),
            data_source: "yahoo".to_string(),
            auto_refresh_enabled: false,
            auto_refresh_interval_minutes: 5,
            etfs: vec![
                EtfInfo::new("EWLD.PA", "Amundi MSCI World UCITS ETF", 0.30),
                EtfInfo::new("PE500.PA", "Lyxor PEA S&P 500 UCITS ETF", 0.25),
                EtfInfo::new("PAEEM.PA", "Lyxor PEA Emergents MSCI EM", 0.15),
                EtfInfo::new("PCEU.PA", "Lyxor STOXX Europe 600 UCITS ETF", 0.20),
                EtfInfo::new("PSP5.PA", "Amundi MSCI Europe UCITS ETF", 0.10),
            ],
            chart_preferences: ChartPreferences::default(),
        }
    }
}
