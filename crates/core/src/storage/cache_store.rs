use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::errors::CoreError;
use crate::models::price::PriceCache;

/// Persists the price cache as JSON
/// (`{ "prices": { ticker: { price, fetched_at } } }`).
///
/// The cache is best-effort by nature, so loading never fails: a missing
/// file is an empty cache, and a corrupt file is logged and treated the
/// same way rather than blocking startup.
pub struct CacheStore;

impl CacheStore {
    /// Platform cache location: `<cache_dir>/pea-tracker/prices.json`.
    pub fn default_path() -> Result<PathBuf, CoreError> {
        dirs::cache_dir()
            .map(|dir| dir.join("pea-tracker").join("prices.json"))
            .ok_or_else(|| CoreError::FileIO("No cache directory available".into()))
    }

    /// Load the cache from `path`. Missing or unreadable files degrade to
    /// an empty cache.
    #[must_use]
    pub fn load(path: &Path) -> PriceCache {
        if !path.exists() {
            debug!(path = %path.display(), "cache file does not exist, starting empty");
            return PriceCache::new();
        }

        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read price cache");
                return PriceCache::new();
            }
        };

        match serde_json::from_str::<PriceCache>(&data) {
            Ok(cache) => {
                debug!(path = %path.display(), tickers = cache.len(), "price cache loaded");
                cache
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "invalid JSON in price cache");
                PriceCache::new()
            }
        }
    }

    /// Save the cache to `path`, creating parent directories as needed.
    pub fn save(cache: &PriceCache, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize cache: {e}")))?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), tickers = cache.len(), "price cache saved");
        Ok(())
    }
}
