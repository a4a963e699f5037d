use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A single ETF holding in the portfolio.
///
/// **Important**: the buy price is fixed at entry time and never refreshed.
/// Current market prices live in `PriceMap` / `PriceCache`, fetched by the
/// price service and handed to the analytics engine separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ticker symbol, uppercased (e.g., "EWLD.PA")
    pub ticker: String,

    /// Human-readable name (e.g., "Amundi MSCI World UCITS ETF")
    pub name: String,

    /// Number of shares owned (fractional shares allowed, always positive)
    pub quantity: f64,

    /// Purchase price per share in the portfolio currency
    pub buy_price: f64,

    /// Date of purchase (no time component — daily granularity)
    pub buy_date: NaiveDate,

    /// Optional user-set price override. When present, valuations use this
    /// instead of any fetched market price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_price: Option<f64>,
}

impl Position {
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
        buy_price: f64,
        buy_date: NaiveDate,
    ) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            name: name.into(),
            quantity,
            buy_price,
            buy_date,
            manual_price: None,
        }
    }

    /// The price valuations should use: the manual override when set,
    /// otherwise the fetched price supplied by the caller.
    #[must_use]
    pub fn effective_price(&self, fetched: Option<f64>) -> Option<f64> {
        self.manual_price.or(fetched)
    }

    /// Check the field rules: non-empty ticker and name, positive quantity
    /// and buy price, positive manual override when set.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ticker.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Ticker must not be empty".into(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Name must not be empty for {}",
                self.ticker
            )));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Quantity for {} must be positive (got {})",
                self.ticker, self.quantity
            )));
        }
        if !self.buy_price.is_finite() || self.buy_price <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Buy price for {} must be positive (got {})",
                self.ticker, self.buy_price
            )));
        }
        if let Some(p) = self.manual_price {
            if !p.is_finite() || p <= 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Manual price for {} must be positive (got {p})",
                    self.ticker
                )));
            }
        }
        Ok(())
    }
}
