use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::PricePoint;

/// Trait abstraction over market data sources.
///
/// The one real implementation is Yahoo Finance; tests substitute mocks.
/// If the API stops working or changes, only the implementation is
/// replaced — the price service and everything above it are untouched.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Get the current (latest) price for a ticker.
    async fn current_price(&self, ticker: &str) -> Result<f64, CoreError>;

    /// Get daily close prices for a date range (inclusive).
    /// Returns points sorted by date; trading gaps (weekends, holidays)
    /// simply produce no point.
    async fn historical_series(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
