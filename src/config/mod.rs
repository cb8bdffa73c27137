//! Configuration management module
//!
//! Configuration is stored in %APPDATA%\DustOff\config.json with atomic writes
//! to prevent corruption.

pub mod manager;
pub mod models;

pub use manager::ConfigManager;
pub use models::{AppConfig, Preferences};
