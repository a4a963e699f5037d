use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

/// Ticker → current price. Supplied by the price service; may be partial
/// (tickers whose fetch failed are simply absent, never zero).
pub type PriceMap = HashMap<String, f64>;

/// A single price data point (date → close price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Chronologically ordered close prices for one ticker.
pub type HistoricalSeries = Vec<PricePoint>;

/// A cached current price together with the moment it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPrice {
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Local cache of last-known current prices, keyed by ticker.
///
/// Used as the offline fallback: when a fetch fails, the most recent cached
/// value is served instead (marked stale by the price service).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCache {
    /// Ticker → last fetched price + timestamp
    pub prices: HashMap<String, CachedPrice>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached entry for a ticker (case-insensitive).
    #[must_use]
    pub fn get(&self, ticker: &str) -> Option<&CachedPrice> {
        self.prices.get(&ticker.to_uppercase())
    }

    /// Insert or overwrite the cached price for a ticker.
    pub fn set(&mut self, ticker: &str, price: f64, fetched_at: DateTime<Utc>) {
        self.prices
            .insert(ticker.to_uppercase(), CachedPrice { price, fetched_at });
    }

    /// Number of tickers with a cached price.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Drop every entry fetched more than `max_age` before `now`.
    /// Returns the number of entries removed. A negative `max_age` is a
    /// caller bug and is rejected rather than silently coerced.
    pub fn prune_older_than(
        &mut self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        if max_age < Duration::zero() {
            return Err(CoreError::ValidationError(format!(
                "max_age must not be negative (got {max_age})"
            )));
        }
        let before = self.prices.len();
        self.prices.retain(|_, entry| now - entry.fetched_at <= max_age);
        Ok(before - self.prices.len())
    }

    /// Clear all cached prices.
    pub fn clear(&mut self) {
        self.prices.clear();
    }
}
