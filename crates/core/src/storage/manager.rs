use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::position::Position;

/// One CSV row. Column names are the on-disk header:
/// `Ticker,Name,Quantity,BuyPrice,BuyDate` (dates ISO-8601).
/// The manual price override is session state and is not exported.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Quantity")]
    quantity: f64,
    #[serde(rename = "BuyPrice")]
    buy_price: f64,
    #[serde(rename = "BuyDate")]
    buy_date: NaiveDate,
}

const CSV_HEADER: [&str; 5] = ["Ticker", "Name", "Quantity", "BuyPrice", "BuyDate"];

/// High-level portfolio persistence: JSON and CSV, both plain text.
///
/// The string/file split mirrors the rest of the storage layer: the string
/// variants are pure and easy to test, the file variants add the I/O.
pub struct StorageManager;

impl StorageManager {
    // ── JSON ────────────────────────────────────────────────────────

    /// Serialize a portfolio to pretty JSON (`{ "positions": [...] }`,
    /// ISO-8601 dates).
    pub fn save_to_json_string(portfolio: &Portfolio) -> Result<String, CoreError> {
        serde_json::to_string_pretty(portfolio)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))
    }

    /// Parse a portfolio from JSON. Every position is re-validated, and
    /// ticker uniqueness is re-established (later duplicates replace
    /// earlier ones, same as live upserts).
    pub fn load_from_json_str(json: &str) -> Result<Portfolio, CoreError> {
        let raw: Portfolio = serde_json::from_str(json)?;
        for position in raw.positions() {
            position.validate()?;
        }
        Ok(Portfolio::from_positions(raw.positions().to_vec()))
    }

    /// Save a portfolio to a JSON file.
    pub fn save_to_json(portfolio: &Portfolio, path: &Path) -> Result<(), CoreError> {
        let json = Self::save_to_json_string(portfolio)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), positions = portfolio.len(), "portfolio saved to JSON");
        Ok(())
    }

    /// Load a portfolio from a JSON file.
    pub fn load_from_json(path: &Path) -> Result<Portfolio, CoreError> {
        let json = std::fs::read_to_string(path)?;
        let portfolio = Self::load_from_json_str(&json)?;
        info!(path = %path.display(), positions = portfolio.len(), "portfolio loaded from JSON");
        Ok(portfolio)
    }

    // ── CSV ─────────────────────────────────────────────────────────

    /// Serialize a portfolio to CSV with the
    /// `Ticker,Name,Quantity,BuyPrice,BuyDate` header, rows in portfolio
    /// order.
    pub fn export_to_csv_string(portfolio: &Portfolio) -> Result<String, CoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for position in portfolio.positions() {
            writer.serialize(CsvRecord {
                ticker: position.ticker.clone(),
                name: position.name.clone(),
                quantity: position.quantity,
                buy_price: position.buy_price,
                buy_date: position.buy_date,
            })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Parse a portfolio from CSV text.
    ///
    /// The header must be exactly `Ticker,Name,Quantity,BuyPrice,BuyDate`.
    /// Every row is validated; the import is all-or-nothing, and a failed
    /// import reports *every* bad row (1-based data row numbers, header
    /// excluded) with its reason.
    pub fn import_from_csv_str(data: &str) -> Result<Portfolio, CoreError> {
        let mut reader = csv::Reader::from_reader(data.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.iter().collect::<Vec<_>>() != CSV_HEADER {
            return Err(CoreError::InvalidFileFormat(format!(
                "Expected CSV header '{}', got '{}'",
                CSV_HEADER.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let mut positions = Vec::new();
        let mut bad_rows: Vec<String> = Vec::new();

        for (idx, record) in reader.deserialize::<CsvRecord>().enumerate() {
            let row = idx + 1;
            match record {
                Ok(r) => {
                    let position =
                        Position::new(r.ticker, r.name, r.quantity, r.buy_price, r.buy_date);
                    match position.validate() {
                        Ok(()) => positions.push(position),
                        Err(e) => bad_rows.push(format!("row {row}: {e}")),
                    }
                }
                Err(e) => bad_rows.push(format!("row {row}: {e}")),
            }
        }

        if !bad_rows.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "CSV import rejected, {} invalid row(s): {}",
                bad_rows.len(),
                bad_rows.join("; ")
            )));
        }

        Ok(Portfolio::from_positions(positions))
    }

    /// Export a portfolio to a CSV file.
    pub fn export_to_csv(portfolio: &Portfolio, path: &Path) -> Result<(), CoreError> {
        let data = Self::export_to_csv_string(portfolio)?;
        std::fs::write(path, data)?;
        info!(path = %path.display(), positions = portfolio.len(), "portfolio exported to CSV");
        Ok(())
    }

    /// Import a portfolio from a CSV file.
    pub fn import_from_csv(path: &Path) -> Result<Portfolio, CoreError> {
        let data = std::fs::read_to_string(path)?;
        let portfolio = Self::import_from_csv_str(&data)?;
        info!(path = %path.display(), positions = portfolio.len(), "portfolio imported from CSV");
        Ok(portfolio)
    }
}
