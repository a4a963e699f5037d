pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, Utc};

use errors::CoreError;
use models::chart::ChartSpec;
use models::metrics::{CorrelationMatrix, PortfolioSummary, ReturnPeriod, ReturnSeries};
use models::portfolio::Portfolio;
use models::position::Position;
use models::price::{CachedPrice, HistoricalSeries, PriceCache, PriceMap};
use models::settings::Settings;
use providers::traits::PriceProvider;
use services::analytics_service::AnalyticsService;
use services::chart_service::ChartService;
use services::portfolio_service::PortfolioService;
use services::price_service::{HistoryRange, PriceQuote, PriceService};
use storage::cache_store::CacheStore;
use storage::config_store::ConfigStore;
use storage::manager::StorageManager;

/// Main entry point for the PEA ETF Tracker core library.
/// Holds the portfolio state and all services needed to operate on it.
///
/// The `dirty` flag tracks unsaved *portfolio* mutations (positions and
/// manual price overrides). Settings and the price cache are persisted
/// separately and do not affect it.
#[must_use]
pub struct EtfTracker {
    portfolio: Portfolio,
    settings: Settings,
    price_cache: PriceCache,
    portfolio_service: PortfolioService,
    price_service: PriceService,
    chart_service: ChartService,
    analytics_service: AnalyticsService,
    /// Tracks whether any portfolio mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for EtfTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtfTracker")
            .field("positions", &self.portfolio.len())
            .field("settings", &self.settings)
            .field("cached_prices", &self.price_cache.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl EtfTracker {
    /// Create a brand new empty portfolio with default settings,
    /// backed by Yahoo Finance.
    pub fn create_new() -> Result<Self, CoreError> {
        Ok(Self::build(Portfolio::new(), PriceService::with_yahoo()?))
    }

    /// Create an empty tracker backed by a custom price provider
    /// (a different market data source, or a mock in tests).
    pub fn with_provider(provider: Box<dyn PriceProvider>) -> Self {
        Self::build(Portfolio::new(), PriceService::new(provider))
    }

    /// Load an existing portfolio from a JSON file.
    pub fn load_from_json(path: &Path) -> Result<Self, CoreError> {
        let portfolio = StorageManager::load_from_json(path)?;
        Ok(Self::build(portfolio, PriceService::with_yahoo()?))
    }

    /// Build a portfolio by importing a CSV file
    /// (header `Ticker,Name,Quantity,BuyPrice,BuyDate`).
    pub fn import_from_csv(path: &Path) -> Result<Self, CoreError> {
        let portfolio = StorageManager::import_from_csv(path)?;
        Ok(Self::build(portfolio, PriceService::with_yahoo()?))
    }

    /// Save the current portfolio to a JSON file.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_json(&mut self, path: &Path) -> Result<(), CoreError> {
        StorageManager::save_to_json(&self.portfolio, path)?;
        self.dirty = false;
        Ok(())
    }

    /// Export the current portfolio to a CSV file.
    /// An export is a copy, not the canonical save — the unsaved-changes
    /// flag is left untouched.
    pub fn export_to_csv(&self, path: &Path) -> Result<(), CoreError> {
        StorageManager::export_to_csv(&self.portfolio, path)
    }

    // ── Position Management ─────────────────────────────────────────

    /// Add a position to the portfolio. If the ticker already exists the
    /// old record is replaced, keeping its slot in display order.
    /// Returns the replaced position, if any.
    pub fn add_position(
        &mut self,
        ticker: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
        buy_price: f64,
        buy_date: NaiveDate,
    ) -> Result<Option<Position>, CoreError> {
        let position = Position::new(ticker, name, quantity, buy_price, buy_date);
        let replaced = self
            .portfolio_service
            .add_position(&mut self.portfolio, position)?;
        self.dirty = true;
        Ok(replaced)
    }

    /// Remove a position by ticker. Returns the removed position.
    pub fn remove_position(&mut self, ticker: &str) -> Result<Position, CoreError> {
        let removed = self
            .portfolio_service
            .remove_position(&mut self.portfolio, ticker)?;
        self.dirty = true;
        Ok(removed)
    }

    /// Replace the position stored under `ticker` with a new record
    /// (which may carry a different ticker).
    pub fn update_position(&mut self, ticker: &str, position: Position) -> Result<(), CoreError> {
        self.portfolio_service
            .update_position(&mut self.portfolio, ticker, position)?;
        self.dirty = true;
        Ok(())
    }

    /// Set or clear a position's manual price override. When set, every
    /// valuation uses it instead of the fetched market price.
    pub fn set_manual_price(
        &mut self,
        ticker: &str,
        manual_price: Option<f64>,
    ) -> Result<(), CoreError> {
        self.portfolio_service
            .set_manual_price(&mut self.portfolio, ticker, manual_price)?;
        self.dirty = true;
        Ok(())
    }

    /// Look up a position by ticker (case-insensitive).
    #[must_use]
    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.portfolio.get(ticker)
    }

    /// All positions in display order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        self.portfolio.positions()
    }

    /// All tickers in display order.
    #[must_use]
    pub fn tickers(&self) -> Vec<String> {
        self.portfolio.tickers()
    }

    #[must_use]
    pub fn position_count(&self) -> usize {
        self.portfolio.len()
    }

    // ── Market Data ─────────────────────────────────────────────────

    /// Fetch current prices for every held ticker in one pass, producing
    /// the complete snapshot the analytics functions consume. Failed
    /// fetches fall back to cached values (marked stale internally);
    /// tickers with neither are absent from the map.
    pub async fn refresh_prices(&mut self) -> PriceMap {
        let tickers = self.portfolio.tickers();
        self.price_service
            .current_prices(&mut self.price_cache, &tickers)
            .await
    }

    /// Resolve the current price for one ticker, with cache fallback.
    pub async fn fetch_price(&mut self, ticker: &str) -> Option<PriceQuote> {
        self.price_service
            .current_price(&mut self.price_cache, ticker)
            .await
    }

    /// Fetch historical close series for every held ticker over `range`.
    /// Tickers whose fetch failed are absent from the map.
    pub async fn fetch_history(
        &self,
        range: HistoryRange,
    ) -> HashMap<String, HistoricalSeries> {
        let tickers = self.portfolio.tickers();
        self.price_service.historical_data(&tickers, range).await
    }

    // ── Analytics ───────────────────────────────────────────────────

    /// Full portfolio summary as of today, in the configured currency.
    #[must_use]
    pub fn summary(&self, prices: &PriceMap) -> PortfolioSummary {
        self.analytics_service.portfolio_summary(
            &self.portfolio,
            prices,
            Utc::now().date_naive(),
            &self.settings.default_currency,
        )
    }

    /// Total portfolio value given a price snapshot.
    #[must_use]
    pub fn portfolio_value(&self, prices: &PriceMap) -> f64 {
        self.analytics_service.portfolio_value(&self.portfolio, prices)
    }

    /// Total amount invested (independent of market prices).
    #[must_use]
    pub fn total_invested(&self) -> f64 {
        self.analytics_service.total_invested(&self.portfolio)
    }

    /// Absolute profit/loss. Positive = gain.
    #[must_use]
    pub fn pnl(&self, prices: &PriceMap) -> f64 {
        self.analytics_service.pnl(&self.portfolio, prices)
    }

    /// Percentage return (0 when nothing is invested).
    #[must_use]
    pub fn pnl_percent(&self, prices: &PriceMap) -> f64 {
        self.analytics_service.pnl_percent(&self.portfolio, prices)
    }

    /// Per-ticker current value.
    #[must_use]
    pub fn position_values(&self, prices: &PriceMap) -> HashMap<String, f64> {
        self.analytics_service.position_values(&self.portfolio, prices)
    }

    /// Per-ticker allocation percentage.
    #[must_use]
    pub fn allocation(&self, prices: &PriceMap) -> HashMap<String, f64> {
        self.analytics_service.allocation(&self.portfolio, prices)
    }

    /// Portfolio-level periodic returns from historical data.
    #[must_use]
    pub fn returns(
        &self,
        history: &HashMap<String, HistoricalSeries>,
        period: ReturnPeriod,
    ) -> ReturnSeries {
        self.analytics_service.returns(&self.portfolio, history, period)
    }

    /// Volatility of a return series (annualized by default policy of the
    /// caller; pass `annualize: false` for the raw per-period figure).
    #[must_use]
    pub fn volatility(&self, returns: &ReturnSeries, annualize: bool) -> f64 {
        self.analytics_service.volatility(returns, annualize)
    }

    /// Sharpe ratio of a return series.
    #[must_use]
    pub fn sharpe_ratio(
        &self,
        returns: &ReturnSeries,
        risk_free_rate: f64,
        annualize: bool,
    ) -> f64 {
        self.analytics_service
            .sharpe_ratio(returns, risk_free_rate, annualize)
    }

    /// Maximum drawdown of an ordered value series, as a fraction ≤ 0.
    #[must_use]
    pub fn max_drawdown(&self, values: &[f64]) -> f64 {
        self.analytics_service.max_drawdown(values)
    }

    /// Pairwise correlation matrix of daily returns.
    #[must_use]
    pub fn correlation_matrix(
        &self,
        history: &HashMap<String, HistoricalSeries>,
    ) -> CorrelationMatrix {
        self.analytics_service.correlation_matrix(history)
    }

    // ── Charts ──────────────────────────────────────────────────────
    // All builders apply the user's chart preferences before returning.

    /// Line chart of portfolio value over time.
    pub fn portfolio_value_chart(
        &self,
        dates: &[NaiveDate],
        values: &[f64],
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        let mut spec = self.chart_service.portfolio_value_chart(dates, values, title)?;
        self.chart_service
            .apply_theme(&mut spec, &self.settings.chart_preferences);
        Ok(spec)
    }

    /// Pie chart of allocation percentages.
    pub fn allocation_pie_chart(
        &self,
        allocation: &HashMap<String, f64>,
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        let mut spec = self.chart_service.allocation_pie_chart(allocation, title)?;
        self.chart_service
            .apply_theme(&mut spec, &self.settings.chart_preferences);
        Ok(spec)
    }

    /// Bar chart of per-position values.
    pub fn position_values_bar_chart(
        &self,
        position_values: &HashMap<String, f64>,
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        let mut spec = self
            .chart_service
            .position_values_bar_chart(position_values, title)?;
        self.chart_service
            .apply_theme(&mut spec, &self.settings.chart_preferences);
        Ok(spec)
    }

    /// Scatter plot of annualized return vs volatility per ticker.
    pub fn risk_return_scatter(
        &self,
        tickers: &[String],
        returns: &[f64],
        volatilities: &[f64],
        title: &str,
    ) -> Result<ChartSpec, CoreError> {
        let mut spec = self
            .chart_service
            .risk_return_scatter(tickers, returns, volatilities, title)?;
        self.chart_service
            .apply_theme(&mut spec, &self.settings.chart_preferences);
        Ok(spec)
    }

    /// Line chart of one ticker's price history.
    pub fn performance_chart(
        &self,
        ticker: &str,
        series: &HistoricalSeries,
    ) -> Result<ChartSpec, CoreError> {
        let mut spec = self.chart_service.performance_chart(ticker, series)?;
        self.chart_service
            .apply_theme(&mut spec, &self.settings.chart_preferences);
        Ok(spec)
    }

    // ── Cache Management ────────────────────────────────────────────

    /// Number of tickers with a cached price.
    #[must_use]
    pub fn cache_entry_count(&self) -> usize {
        self.price_cache.len()
    }

    /// Get the cached entry for a ticker, if any.
    #[must_use]
    pub fn get_cached_price(&self, ticker: &str) -> Option<&CachedPrice> {
        self.price_cache.get(ticker)
    }

    /// Drop cached prices older than `max_age`.
    /// Returns the number of entries removed.
    pub fn cache_prune_older_than(
        &mut self,
        max_age: chrono::Duration,
    ) -> Result<usize, CoreError> {
        self.price_cache.prune_older_than(max_age, Utc::now())
    }

    /// Clear all cached prices.
    pub fn cache_clear(&mut self) {
        self.price_cache.clear();
    }

    /// Load the price cache from disk (missing/corrupt files degrade to
    /// an empty cache).
    pub fn load_cache(&mut self, path: &Path) {
        self.price_cache = CacheStore::load(path);
    }

    /// Save the price cache to disk.
    pub fn save_cache(&self, path: &Path) -> Result<(), CoreError> {
        CacheStore::save(&self.price_cache, path)
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set the display currency (e.g., "EUR", "USD").
    /// Currency code must be exactly 3 ASCII letters.
    pub fn set_default_currency(&mut self, currency: String) -> Result<(), CoreError> {
        let trimmed = currency.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., EUR, USD)"
            )));
        }
        self.settings.default_currency = trimmed;
        Ok(())
    }

    /// Set the auto-refresh interval in minutes (must be positive).
    pub fn set_auto_refresh_interval(&mut self, minutes: u32) -> Result<(), CoreError> {
        if minutes == 0 {
            return Err(CoreError::ValidationError(
                "Auto-refresh interval must be positive".into(),
            ));
        }
        self.settings.auto_refresh_interval_minutes = minutes;
        Ok(())
    }

    /// Enable or disable timed price refreshes (the timer itself lives in
    /// the frontend; this only records the preference).
    pub fn set_auto_refresh_enabled(&mut self, enabled: bool) {
        self.settings.auto_refresh_enabled = enabled;
    }

    /// Load settings from disk, falling back to defaults when the file is
    /// missing or invalid.
    pub fn load_settings(&mut self, path: &Path) {
        self.settings = ConfigStore::load(path);
    }

    /// Save settings to disk.
    pub fn save_settings(&self, path: &Path) -> Result<(), CoreError> {
        ConfigStore::save(&self.settings, path)
    }

    // ── Dirty State ─────────────────────────────────────────────────

    /// Returns `true` if the portfolio has been modified since the last
    /// save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(portfolio: Portfolio, price_service: PriceService) -> Self {
        Self {
            portfolio,
            settings: Settings::default(),
            price_cache: PriceCache::new(),
            portfolio_service: PortfolioService::new(),
            price_service,
            chart_service: ChartService::new(),
            analytics_service: AnalyticsService::new(),
            dirty: false,
        }
    }
}
