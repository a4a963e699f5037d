use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::settings::Settings;

/// Persists user settings as JSON under the platform config directory.
///
/// Loading never fails: a missing or invalid file falls back to
/// `Settings::default()` so the application always starts with a working
/// configuration. Saving does report I/O errors — silently losing the
/// user's settings is not acceptable the way losing a price cache is.
pub struct ConfigStore;

impl ConfigStore {
    /// Platform config location: `<config_dir>/pea-tracker/config.json`.
    pub fn default_path() -> Result<PathBuf, CoreError> {
        dirs::config_dir()
            .map(|dir| dir.join("pea-tracker").join("config.json"))
            .ok_or_else(|| CoreError::FileIO("No config directory available".into()))
    }

    /// Load settings from `path`, falling back to defaults when the file
    /// is missing or unreadable.
    #[must_use]
    pub fn load(path: &Path) -> Settings {
        if !path.exists() {
            info!(path = %path.display(), "no settings file, using defaults");
            return Settings::default();
        }

        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read settings, using defaults");
                return Settings::default();
            }
        };

        match serde_json::from_str::<Settings>(&data) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Settings::default()
            }
        }
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save(settings: &Settings, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}
