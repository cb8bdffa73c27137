//! Configuration data models
//!
//! Every field has a default, so partial or older config files still load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// User preferences
    pub preferences: Preferences,
    /// Extra marketing-name → process-name aliases for correlation
    ///
    /// Evaluated after the built-in aliases.
    pub process_aliases: BTreeMap<String, String>,
}

/// User preferences and settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether icon lookups degrade to the fallback image
    pub use_fallback_icons: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            use_fallback_icons: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.process_aliases.is_empty());
        assert_eq!(config.preferences.log_level, "info");
        assert!(config.preferences.use_fallback_icons);
    }

    #[test]
    fn test_serialization() {
        let mut config = AppConfig::default();
        config
            .process_aliases
            .insert("microsoft teams".to_string(), "ms-teams".to_string());

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"preferences": {"log_level": "debug"}}"#).unwrap();
        assert_eq!(config.preferences.log_level, "debug");
        assert!(config.preferences.use_fallback_icons);
        assert!(config.process_aliases.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let config: AppConfig =
            serde_json::from_str(r#"{"window_state": {"x": 1}, "process_aliases": {"a": "b"}}"#)
                .unwrap();
        assert_eq!(config.process_aliases.get("a").map(String::as_str), Some("b"));
    }
}
