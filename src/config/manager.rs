//! Configuration manager for loading and saving application configuration
//!
//! Configuration lives in %APPDATA%\DustOff\config.json and is written
//! atomically through a temporary file in the same directory.

use crate::config::models::AppConfig;
use crate::error::{DustOffError, Result, StringError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Application data directory: %APPDATA%\DustOff
    pub fn data_dir() -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("DustOff")
    }

    /// Get the path to the configuration file
    ///
    /// Returns: %APPDATA%\DustOff\config.json
    pub fn get_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }

    /// Load configuration from the default location
    pub fn load() -> Result<AppConfig> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from `path`
    ///
    /// A missing or corrupt file yields the default configuration; other I/O
    /// errors are returned.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Configuration file not found at {:?}, using defaults", path);
                return Ok(AppConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&json) {
            Ok(config) => {
                info!("Configuration loaded from {:?}", path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse configuration, using defaults: {}", e);
                Ok(AppConfig::default())
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(config: &AppConfig) -> Result<()> {
        Self::save_to(config, &Self::get_config_path())
    }

    /// Save configuration to `path` with an atomic write
    pub fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(config)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| {
            DustOffError::ConfigError(StringError::new(format!(
                "Failed to replace {}: {}",
                path.display(),
                e.error
            )))
        })?;

        info!("Configuration saved to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{AppdataGuard, create_test_dir};

    #[test]
    fn test_config_path() {
        let path = ConfigManager::get_config_path();
        assert!(path.to_string_lossy().contains("DustOff"));
        assert!(path.to_string_lossy().ends_with("config.json"));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = create_test_dir();
        let config = ConfigManager::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_corrupt_config() {
        let dir = create_test_dir();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = ConfigManager::load_from(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = create_test_dir();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.preferences.log_level = "debug".to_string();
        config
            .process_aliases
            .insert("obs studio".to_string(), "obs64".to_string());

        ConfigManager::save_to(&config, &path).unwrap();
        assert_eq!(ConfigManager::load_from(&path).unwrap(), config);

        // Overwrite in place
        config.preferences.use_fallback_icons = false;
        ConfigManager::save_to(&config, &path).unwrap();
        assert!(!ConfigManager::load_from(&path).unwrap().preferences.use_fallback_icons);
    }

    #[test]
    fn test_default_location_follows_appdata() {
        let dir = create_test_dir();
        let _guard = AppdataGuard::new(&dir);

        let expected = dir.path().join("DustOff").join("config.json");
        assert_eq!(ConfigManager::get_config_path(), expected);
        ConfigManager::save(&AppConfig::default()).unwrap();
        assert!(expected.exists());
        assert_eq!(ConfigManager::load().unwrap(), AppConfig::default());
    }
}
