use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use tracing::warn;

use crate::models::metrics::{
    CorrelationMatrix, PortfolioSummary, PositionSummary, ReturnPeriod, ReturnSeries,
};
use crate::models::portfolio::Portfolio;
use crate::models::price::{HistoricalSeries, PriceMap};

/// Computes portfolio and risk metrics from a portfolio and externally
/// supplied price data.
///
/// Every method is pure: no I/O, no mutation of inputs. Incomplete market
/// data is never an error — results degrade to documented zero/empty values
/// and a warning is logged naming what was missing. The engine never fetches
/// anything itself; callers resolve prices and history first and hand in a
/// complete snapshot.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Total portfolio value: Σ price × quantity over positions with a
    /// usable price. A position's manual override beats the fetched price;
    /// positions with neither are skipped (not valued at zero) with a
    /// warning. Empty portfolio → 0.0.
    pub fn portfolio_value(&self, portfolio: &Portfolio, prices: &PriceMap) -> f64 {
        let mut total = 0.0;

        for position in portfolio.positions() {
            match position.effective_price(prices.get(&position.ticker).copied()) {
                Some(price) => total += price * position.quantity,
                None => {
                    warn!(ticker = %position.ticker, "price not available, skipping position");
                }
            }
        }

        total
    }

    /// Total amount invested: Σ buy_price × quantity over all positions.
    /// Never depends on market prices. Empty portfolio → 0.0.
    pub fn total_invested(&self, portfolio: &Portfolio) -> f64 {
        portfolio
            .positions()
            .iter()
            .map(|p| p.buy_price * p.quantity)
            .sum()
    }

    /// Profit/loss: `portfolio_value - total_invested`. Positive = gain.
    pub fn pnl(&self, portfolio: &Portfolio, prices: &PriceMap) -> f64 {
        self.portfolio_value(portfolio, prices) - self.total_invested(portfolio)
    }

    /// Percentage return: pnl / total_invested × 100.
    /// Returns 0.0 when nothing is invested (documented, not an error).
    pub fn pnl_percent(&self, portfolio: &Portfolio, prices: &PriceMap) -> f64 {
        let invested = self.total_invested(portfolio);
        if invested > 0.0 {
            self.pnl(portfolio, prices) / invested * 100.0
        } else {
            0.0
        }
    }

    /// Per-position value (price × quantity). Positions without a usable
    /// price are omitted, each with a warning.
    pub fn position_values(&self, portfolio: &Portfolio, prices: &PriceMap) -> HashMap<String, f64> {
        let mut values = HashMap::new();

        for position in portfolio.positions() {
            match position.effective_price(prices.get(&position.ticker).copied()) {
                Some(price) => {
                    values.insert(position.ticker.clone(), price * position.quantity);
                }
                None => {
                    warn!(ticker = %position.ticker, "price not available, skipping position");
                }
            }
        }

        values
    }

    /// Allocation percentage per position (value / total × 100).
    /// Empty map when the total value is 0 (empty portfolio or no prices).
    /// Non-empty results sum to 100 within floating-point tolerance.
    pub fn allocation(&self, portfolio: &Portfolio, prices: &PriceMap) -> HashMap<String, f64> {
        if portfolio.is_empty() {
            return HashMap::new();
        }

        let values = self.position_values(portfolio, prices);
        let total: f64 = values.values().sum();

        if total == 0.0 {
            warn!("total portfolio value is zero, cannot compute allocation");
            return HashMap::new();
        }

        values
            .into_iter()
            .map(|(ticker, value)| (ticker, value / total * 100.0))
            .collect()
    }

    /// Portfolio-level periodic returns.
    ///
    /// Portfolio value is reconstructed at each historical date using the
    /// buy-time-fixed quantities, on the intersection of dates present for
    /// *all* contributing tickers (positions without history are skipped
    /// with a warning). For weekly/monthly granularity the value series
    /// collapses to the last date of each ISO week / calendar month before
    /// differencing. Fewer than 2 aligned dates → empty series.
    pub fn returns(
        &self,
        portfolio: &Portfolio,
        history: &HashMap<String, HistoricalSeries>,
        period: ReturnPeriod,
    ) -> ReturnSeries {
        if portfolio.is_empty() {
            warn!("portfolio is empty, returning empty return series");
            return ReturnSeries::empty(period);
        }

        // Buy-time-fixed quantity + date→close map per contributing ticker
        let mut quantities: Vec<f64> = Vec::new();
        let mut closes: Vec<HashMap<NaiveDate, f64>> = Vec::new();
        for position in portfolio.positions() {
            match history.get(&position.ticker) {
                Some(series) if !series.is_empty() => {
                    quantities.push(position.quantity);
                    closes.push(series.iter().map(|p| (p.date, p.price)).collect());
                }
                _ => {
                    warn!(ticker = %position.ticker, "historical data not available, skipping");
                }
            }
        }
        if closes.is_empty() {
            warn!("no historical data for any position");
            return ReturnSeries::empty(period);
        }

        // Inner join: only dates every contributing ticker has
        let mut aligned: Vec<NaiveDate> = closes[0].keys().copied().collect();
        aligned.retain(|d| closes.iter().all(|m| m.contains_key(d)));
        aligned.sort_unstable();
        if aligned.len() < 2 {
            warn!("fewer than 2 aligned dates across historical data");
            return ReturnSeries::empty(period);
        }

        let values: Vec<(NaiveDate, f64)> = aligned
            .iter()
            .map(|date| {
                let value = closes
                    .iter()
                    .zip(&quantities)
                    .map(|(m, quantity)| m[date] * quantity)
                    .sum();
                (*date, value)
            })
            .collect();

        let values = match period {
            ReturnPeriod::Daily => values,
            ReturnPeriod::Weekly => last_per_bucket(values, |d| {
                let week = d.iso_week();
                (week.year(), week.week())
            }),
            ReturnPeriod::Monthly => last_per_bucket(values, |d| (d.year(), d.month())),
        };

        let mut points = Vec::with_capacity(values.len().saturating_sub(1));
        for pair in values.windows(2) {
            let (_, prev) = pair[0];
            let (date, curr) = pair[1];
            if prev > 0.0 {
                points.push((date, (curr - prev) / prev));
            }
        }

        ReturnSeries { period, points }
    }

    /// Volatility: sample standard deviation (n−1 divisor) of the returns.
    /// Annualization multiplies by √(periods per year) of the series' own
    /// period, so the factor always matches the granularity the series was
    /// produced at. Fewer than 2 points → 0.0.
    pub fn volatility(&self, returns: &ReturnSeries, annualize: bool) -> f64 {
        let values = returns.values();
        if values.len() < 2 {
            warn!("fewer than 2 return points, returning 0.0 volatility");
            return 0.0;
        }

        let sd = sample_std_dev(&values);
        if annualize {
            sd * returns.period.periods_per_year().sqrt()
        } else {
            sd
        }
    }

    /// Sharpe ratio: mean excess return over volatility, annualized
    /// consistently with `volatility`. Returns 0.0 when volatility is 0 —
    /// propagating infinity/NaN into a UI would fail silently, so the
    /// degenerate case is pinned to zero instead.
    pub fn sharpe_ratio(
        &self,
        returns: &ReturnSeries,
        risk_free_rate: f64,
        annualize: bool,
    ) -> f64 {
        if returns.is_empty() {
            warn!("return series is empty, returning 0.0 Sharpe ratio");
            return 0.0;
        }

        let sd = self.volatility(returns, false);
        if sd == 0.0 {
            warn!("volatility is zero, returning 0.0 Sharpe ratio");
            return 0.0;
        }

        let values = returns.values();
        let mean_excess =
            values.iter().map(|r| r - risk_free_rate).sum::<f64>() / values.len() as f64;

        let mut sharpe = mean_excess / sd;
        if annualize {
            sharpe *= returns.period.periods_per_year().sqrt();
        }
        sharpe
    }

    /// Maximum drawdown of an ordered value series: the most negative
    /// (value − running peak) / running peak, as a fraction ≤ 0.
    /// 0.0 means no decline; fewer than 2 points → 0.0.
    pub fn max_drawdown(&self, values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }

        let mut running_max = values[0];
        let mut max_dd = 0.0;
        for &value in values {
            if value > running_max {
                running_max = value;
            }
            if running_max > 0.0 {
                let drawdown = (value - running_max) / running_max;
                if drawdown < max_dd {
                    max_dd = drawdown;
                }
            }
        }
        max_dd
    }

    /// Pairwise Pearson correlation of daily returns between tickers.
    ///
    /// Dates are aligned per pair (inner join of just the two series) —
    /// deliberately *not* one global intersection, so a pair with good
    /// mutual coverage keeps its data even when a third ticker is sparse.
    /// Diagonal is 1.0; the matrix is symmetric; pairs with fewer than 2
    /// aligned return points are `NAN`, never 0.
    pub fn correlation_matrix(
        &self,
        history: &HashMap<String, HistoricalSeries>,
    ) -> CorrelationMatrix {
        if history.is_empty() {
            warn!("historical data is empty, returning empty correlation matrix");
            return CorrelationMatrix::empty();
        }

        let mut tickers: Vec<String> = history.keys().cloned().collect();
        tickers.sort_unstable();

        let closes: Vec<HashMap<NaiveDate, f64>> = tickers
            .iter()
            .map(|t| history[t].iter().map(|p| (p.date, p.price)).collect())
            .collect();

        let n = tickers.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let cell = pairwise_return_correlation(&closes[i], &closes[j]);
                values[i][j] = cell;
                values[j][i] = cell;
            }
        }

        CorrelationMatrix { tickers, values }
    }

    /// Full portfolio summary at a point in time: totals, P&L, and a
    /// per-position breakdown sorted by allocation (largest first).
    /// Tickers without a usable price are listed in `missing_prices` and
    /// valued at zero in their row, while still counting toward
    /// `total_invested`.
    pub fn portfolio_summary(
        &self,
        portfolio: &Portfolio,
        prices: &PriceMap,
        as_of_date: NaiveDate,
        currency: &str,
    ) -> PortfolioSummary {
        let total_value = self.portfolio_value(portfolio, prices);
        let total_invested = self.total_invested(portfolio);
        let pnl = total_value - total_invested;
        let pnl_percent = if total_invested > 0.0 {
            pnl / total_invested * 100.0
        } else {
            0.0
        };

        let mut positions = Vec::with_capacity(portfolio.len());
        let mut missing_prices = Vec::new();

        for position in portfolio.positions() {
            let price = position.effective_price(prices.get(&position.ticker).copied());
            let invested = position.buy_price * position.quantity;

            let (value, gain_loss, allocation_pct) = match price {
                Some(p) => {
                    let value = p * position.quantity;
                    let allocation = if total_value > 0.0 {
                        value / total_value * 100.0
                    } else {
                        0.0
                    };
                    (value, value - invested, allocation)
                }
                None => {
                    missing_prices.push(position.ticker.clone());
                    (0.0, 0.0, 0.0)
                }
            };

            positions.push(PositionSummary {
                ticker: position.ticker.clone(),
                name: position.name.clone(),
                quantity: position.quantity,
                price,
                value,
                invested,
                gain_loss,
                allocation_pct,
            });
        }

        positions.sort_by(|a, b| {
            b.allocation_pct
                .partial_cmp(&a.allocation_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        PortfolioSummary {
            as_of_date,
            currency: currency.to_string(),
            total_value,
            total_invested,
            pnl,
            pnl_percent,
            positions,
            missing_prices,
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

// ── Internal helpers ────────────────────────────────────────────────

/// Keep only the last (date, value) of each bucket, in order.
fn last_per_bucket<K: PartialEq>(
    values: Vec<(NaiveDate, f64)>,
    bucket: impl Fn(NaiveDate) -> K,
) -> Vec<(NaiveDate, f64)> {
    let mut out: Vec<(NaiveDate, f64)> = Vec::new();
    let mut current: Option<K> = None;

    for (date, value) in values {
        let key = bucket(date);
        match out.last_mut() {
            Some(last) if current.as_ref() == Some(&key) => *last = (date, value),
            _ => {
                out.push((date, value));
                current = Some(key);
            }
        }
    }
    out
}

/// Sample standard deviation with the n−1 divisor. Caller guarantees n ≥ 2.
fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Pearson correlation of the daily returns of two close-price series,
/// aligned on their common dates. NAN when fewer than 2 return points
/// exist or either side has zero variance.
fn pairwise_return_correlation(
    a: &HashMap<NaiveDate, f64>,
    b: &HashMap<NaiveDate, f64>,
) -> f64 {
    let mut dates: Vec<NaiveDate> = a.keys().filter(|d| b.contains_key(d)).copied().collect();
    dates.sort_unstable();

    let mut returns_a = Vec::with_capacity(dates.len().saturating_sub(1));
    let mut returns_b = Vec::with_capacity(dates.len().saturating_sub(1));
    for pair in dates.windows(2) {
        let (a0, a1) = (a[&pair[0]], a[&pair[1]]);
        let (b0, b1) = (b[&pair[0]], b[&pair[1]]);
        if a0 > 0.0 && b0 > 0.0 {
            returns_a.push((a1 - a0) / a0);
            returns_b.push((b1 - b0) / b0);
        }
    }
    if returns_a.len() < 2 {
        return f64::NAN;
    }
    pearson(&returns_a, &returns_b)
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}
