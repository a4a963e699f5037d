use serde::{Deserialize, Serialize};

use super::position::Position;

/// An ordered collection of ETF positions.
///
/// Order is insertion/load order — not semantically significant, but
/// preserved so display and export stay deterministic. At most one position
/// exists per ticker: upserting a ticker that is already present replaces
/// the existing record in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    positions: Vec<Position>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a portfolio from a list of positions. Later duplicates of a
    /// ticker replace earlier ones, keeping the earlier slot.
    pub fn from_positions(positions: Vec<Position>) -> Self {
        let mut portfolio = Self::new();
        for position in positions {
            portfolio.upsert(position);
        }
        portfolio
    }

    /// Insert a position, or replace the existing one with the same ticker.
    /// Returns the replaced position, if any.
    pub fn upsert(&mut self, position: Position) -> Option<Position> {
        match self.index_of(&position.ticker) {
            Some(idx) => Some(std::mem::replace(&mut self.positions[idx], position)),
            None => {
                self.positions.push(position);
                None
            }
        }
    }

    /// Remove a position by ticker (case-insensitive).
    /// Returns the removed position, or `None` if the ticker is unknown.
    pub fn remove(&mut self, ticker: &str) -> Option<Position> {
        self.index_of(ticker).map(|idx| self.positions.remove(idx))
    }

    /// Replace the position stored under `ticker` with `position`
    /// (whole-record replacement; the new record may carry a different
    /// ticker). Returns the old position, or `None` if `ticker` is unknown.
    pub fn replace(&mut self, ticker: &str, position: Position) -> Option<Position> {
        self.index_of(ticker)?;
        // If the record was re-keyed onto a ticker that already exists
        // elsewhere, drop that other slot to keep tickers unique.
        if !position.ticker.eq_ignore_ascii_case(ticker) {
            if let Some(other) = self.index_of(&position.ticker) {
                self.positions.remove(other);
            }
        }
        let idx = self.index_of(ticker)?;
        Some(std::mem::replace(&mut self.positions[idx], position))
    }

    /// Look up a position by ticker (case-insensitive).
    #[must_use]
    pub fn get(&self, ticker: &str) -> Option<&Position> {
        self.index_of(ticker).map(|idx| &self.positions[idx])
    }

    pub(crate) fn get_mut(&mut self, ticker: &str) -> Option<&mut Position> {
        self.index_of(ticker).map(move |idx| &mut self.positions[idx])
    }

    /// All positions in insertion order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// All tickers in insertion order.
    #[must_use]
    pub fn tickers(&self) -> Vec<String> {
        self.positions.iter().map(|p| p.ticker.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn index_of(&self, ticker: &str) -> Option<usize> {
        self.positions
            .iter()
            .position(|p| p.ticker.eq_ignore_ascii_case(ticker))
    }
}
