use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::errors::CoreError;
use crate::models::price::{HistoricalSeries, PriceCache, PriceMap};
use crate::providers::traits::PriceProvider;
use crate::providers::yahoo_finance::YahooFinanceProvider;

/// How far back to fetch historical prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl HistoryRange {
    /// Calendar days covered by this range.
    #[must_use]
    pub fn days(&self) -> i64 {
        match self {
            HistoryRange::OneMonth => 31,
            HistoryRange::ThreeMonths => 92,
            HistoryRange::SixMonths => 183,
            HistoryRange::OneYear => 365,
            HistoryRange::TwoYears => 730,
            HistoryRange::FiveYears => 1826,
        }
    }
}

/// A resolved current price: the value, when it was fetched, and whether it
/// came from the cache because a fresh fetch failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price: f64,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

/// Fetches market data from the provider, falling back to cached values.
///
/// Fallback strategy (the analytics engine never sees any of this — it only
/// receives the resolved values):
/// - fresh fetch succeeds → cache updated, quote returned with `stale: false`
/// - fetch fails → most recent cached price returned with `stale: true`
/// - fetch fails and nothing cached → `None`, with an error logged
///
/// **Note on precision**: prices are `f64` (~15-17 significant digits),
/// sufficient here; repeated arithmetic may accumulate small errors.
pub struct PriceService {
    provider: Box<dyn PriceProvider>,
}

impl PriceService {
    pub fn new(provider: Box<dyn PriceProvider>) -> Self {
        Self { provider }
    }

    /// Build a service backed by Yahoo Finance, the default source.
    pub fn with_yahoo() -> Result<Self, CoreError> {
        Ok(Self::new(Box::new(YahooFinanceProvider::new()?)))
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Resolve the current price for one ticker, updating the cache on a
    /// successful fetch and falling back to it otherwise. Non-finite or
    /// negative provider prices are treated as fetch failures.
    pub async fn current_price(
        &self,
        cache: &mut PriceCache,
        ticker: &str,
    ) -> Option<PriceQuote> {
        match self.provider.current_price(ticker).await {
            Ok(price) if price.is_finite() && price >= 0.0 => {
                let fetched_at = Utc::now();
                cache.set(ticker, price, fetched_at);
                info!(ticker, price, "fetched current price");
                Some(PriceQuote {
                    price,
                    fetched_at,
                    stale: false,
                })
            }
            Ok(price) => {
                warn!(ticker, price, "provider returned an invalid price");
                Self::cached_fallback(cache, ticker)
            }
            Err(e) => {
                error!(ticker, error = %e, "price fetch failed");
                Self::cached_fallback(cache, ticker)
            }
        }
    }

    /// Resolve current prices for a set of tickers in one pass, producing
    /// the snapshot the analytics engine consumes. Tickers that resolve to
    /// nothing (no fetch, no cache) are simply absent from the map.
    pub async fn current_prices(
        &self,
        cache: &mut PriceCache,
        tickers: &[String],
    ) -> PriceMap {
        let mut prices = PriceMap::new();
        for ticker in tickers {
            if let Some(quote) = self.current_price(cache, ticker).await {
                prices.insert(ticker.to_uppercase(), quote.price);
            }
        }
        prices
    }

    /// Fetch the historical close series for one ticker over `range`,
    /// ending today. `None` on failure (with an error logged) — absent
    /// history is a valid, expected analytics input.
    pub async fn historical_series(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Option<HistoricalSeries> {
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(range.days());

        match self.provider.historical_series(ticker, from, to).await {
            Ok(points) => {
                info!(ticker, days = points.len(), "fetched historical series");
                Some(points)
            }
            Err(e) => {
                error!(ticker, error = %e, "historical fetch failed");
                None
            }
        }
    }

    /// Fetch historical series for several tickers. Tickers whose fetch
    /// failed are absent from the map; all results are collected before
    /// any analytics runs on them.
    pub async fn historical_data(
        &self,
        tickers: &[String],
        range: HistoryRange,
    ) -> HashMap<String, HistoricalSeries> {
        let mut data = HashMap::new();
        for ticker in tickers {
            if let Some(series) = self.historical_series(ticker, range).await {
                data.insert(ticker.to_uppercase(), series);
            }
        }
        data
    }

    fn cached_fallback(cache: &PriceCache, ticker: &str) -> Option<PriceQuote> {
        match cache.get(ticker) {
            Some(entry) => {
                info!(ticker, price = entry.price, "serving cached price after failed fetch");
                Some(PriceQuote {
                    price: entry.price,
                    fetched_at: entry.fetched_at,
                    stale: true,
                })
            }
            None => {
                error!(ticker, "no cached price available");
                None
            }
        }
    }
}
