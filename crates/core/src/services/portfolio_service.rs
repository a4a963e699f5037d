use tracing::info;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::position::Position;

/// Manages portfolio positions: validated add/remove/update and the manual
/// price override.
///
/// Pure business logic — no I/O, no API calls. Easy to test.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Add a position to the portfolio, validating it first.
    /// If the ticker is already present the existing record is replaced
    /// (whole-record replacement, keeping its slot in display order).
    /// Returns the replaced position, if any.
    pub fn add_position(
        &self,
        portfolio: &mut Portfolio,
        position: Position,
    ) -> Result<Option<Position>, CoreError> {
        position.validate()?;
        let ticker = position.ticker.clone();
        let replaced = portfolio.upsert(position);
        match &replaced {
            Some(_) => info!(ticker = %ticker, "replaced position"),
            None => info!(ticker = %ticker, "added position"),
        }
        Ok(replaced)
    }

    /// Remove a position by ticker.
    pub fn remove_position(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
    ) -> Result<Position, CoreError> {
        let removed = portfolio
            .remove(ticker)
            .ok_or_else(|| CoreError::PositionNotFound(ticker.to_string()))?;
        info!(ticker = %removed.ticker, "removed position");
        Ok(removed)
    }

    /// Replace the position stored under `ticker` with a new record.
    /// The new record is validated before committing; it may carry a
    /// different ticker (re-keying the position).
    pub fn update_position(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
        position: Position,
    ) -> Result<Position, CoreError> {
        position.validate()?;
        let old = portfolio
            .replace(ticker, position)
            .ok_or_else(|| CoreError::PositionNotFound(ticker.to_string()))?;
        info!(ticker = %ticker, "updated position");
        Ok(old)
    }

    /// Set or clear a position's manual price override.
    /// The override must be positive and finite when set.
    pub fn set_manual_price(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
        manual_price: Option<f64>,
    ) -> Result<(), CoreError> {
        if let Some(price) = manual_price {
            if !price.is_finite() || price <= 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Manual price for {ticker} must be positive (got {price})"
                )));
            }
        }
        let position = portfolio
            .get_mut(ticker)
            .ok_or_else(|| CoreError::PositionNotFound(ticker.to_string()))?;
        position.manual_price = manual_price;
        info!(ticker = %ticker, set = manual_price.is_some(), "manual price override changed");
        Ok(())
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
