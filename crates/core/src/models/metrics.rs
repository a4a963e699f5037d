use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Granularity of a portfolio return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReturnPeriod {
    /// Fixed annualization factor: trading days, weeks, or months per year.
    /// These assume 252/52/12 periods regardless of the calendar span of
    /// the underlying data — a known approximation kept for continuity.
    #[must_use]
    pub fn periods_per_year(&self) -> f64 {
        match self {
            ReturnPeriod::Daily => 252.0,
            ReturnPeriod::Weekly => 52.0,
            ReturnPeriod::Monthly => 12.0,
        }
    }
}

impl std::fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnPeriod::Daily => write!(f, "daily"),
            ReturnPeriod::Weekly => write!(f, "weekly"),
            ReturnPeriod::Monthly => write!(f, "monthly"),
        }
    }
}

/// An ordered sequence of (date, fractional return) points.
///
/// The period travels with the points so that annualization in
/// `volatility`/`sharpe_ratio` can never use a factor that doesn't match
/// the granularity the series was produced at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub period: ReturnPeriod,
    pub points: Vec<(NaiveDate, f64)>,
}

impl ReturnSeries {
    pub fn empty(period: ReturnPeriod) -> Self {
        Self {
            period,
            points: Vec::new(),
        }
    }

    /// Just the return values, in order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, r)| *r).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Summary of the entire portfolio at a point in time.
///
/// Transient — always recomputed from (Portfolio, PriceMap), never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Date this summary was computed for
    pub as_of_date: NaiveDate,

    /// Currency label for all monetary values (display only)
    pub currency: String,

    /// Total portfolio value (positions without a price excluded)
    pub total_value: f64,

    /// Total amount invested (buy_price × quantity over all positions)
    pub total_invested: f64,

    /// Absolute gain/loss: total_value - total_invested
    pub pnl: f64,

    /// Percentage return: pnl / total_invested × 100 (0 when nothing invested)
    pub pnl_percent: f64,

    /// Per-position breakdown, sorted by allocation (largest first)
    pub positions: Vec<PositionSummary>,

    /// Tickers that had no price available when the summary was computed
    pub missing_prices: Vec<String>,
}

/// Summary of a single position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub ticker: String,
    pub name: String,
    pub quantity: f64,

    /// The price used for valuation (manual override or fetched);
    /// `None` when no price was available.
    pub price: Option<f64>,

    /// Current value (0 when unpriced)
    pub value: f64,

    /// buy_price × quantity
    pub invested: f64,

    /// value - invested (0 when unpriced)
    pub gain_loss: f64,

    /// Share of total portfolio value × 100 (0 when unpriced or total is 0)
    pub allocation_pct: f64,
}

/// Pairwise Pearson correlation of daily returns.
///
/// `values[i][j]` is the correlation between `tickers[i]` and `tickers[j]`.
/// The matrix is symmetric with a diagonal of 1.0. Cells that cannot be
/// computed (fewer than 2 aligned return points, or zero variance) hold
/// `f64::NAN` — never 0, so "no data" stays distinguishable from
/// "uncorrelated".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Tickers in matrix order (sorted alphabetically for determinism)
    pub tickers: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn empty() -> Self {
        Self {
            tickers: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Look up a cell by ticker pair.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        Some(self.values[i][j])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}
