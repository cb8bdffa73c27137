//! Error types for `DustOff`
//!
//! This module defines all error types used throughout the crate. Note that the
//! core operations (inventory, correlation, icon resolution, reclamation) absorb
//! per-item failures; these errors only describe whole-source failures and the
//! ambient layers (configuration, logging, icon export).
//!
//! Error variants use `#[source]` to preserve error chains for better
//! observability and debugging.

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `DustOff`
#[derive(Debug, Error)]
pub enum DustOffError {
    /// The live process list could not be enumerated
    #[error("Process enumeration error: {0}")]
    ProcessEnumerationError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Icon extraction or conversion failed
    #[error("Icon error: {0}")]
    IconError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operation needs Windows
    #[error("{0} is only supported on Windows")]
    UnsupportedPlatform(&'static str),

    /// Windows API error
    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// PNG encoding error
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Result type alias for `DustOff` operations
pub type Result<T> = std::result::Result<T, DustOffError>;

/// Convert an error to a user-friendly message
///
/// The messages include troubleshooting hints for the most common causes.
pub fn get_user_friendly_error(error: &DustOffError) -> String {
    match error {
        DustOffError::ProcessEnumerationError(_) => "Failed to list running processes.\n\n\
             Running-state information is unavailable.\n\
             Try again, or run as administrator."
            .to_string(),
        DustOffError::IconError(detail) => {
            format!(
                "Failed to extract an application icon:\n\n{detail}\n\n\
                 A placeholder icon will be shown instead."
            )
        }
        DustOffError::ConfigError(_) => "Failed to load or save configuration.\n\n\
             Your settings may not persist.\n\
             Check that you have write permissions to:\n\
             %APPDATA%\\DustOff"
            .to_string(),
        DustOffError::UnsupportedPlatform(feature) => {
            format!("{feature} requires Windows.\n\nThis platform is not supported.")
        }
        #[cfg(windows)]
        DustOffError::WindowsApiError(e) => {
            format!(
                "A Windows API error occurred:\n\n{e}\n\n\
                 Please ensure your Windows installation is up to date."
            )
        }
        DustOffError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        DustOffError::JsonError(e) => {
            format!(
                "Configuration file is corrupted:\n\n{e}\n\n\
                 The application will use default settings."
            )
        }
        DustOffError::ImageError(e) => {
            format!("Failed to encode the icon image:\n\n{e}")
        }
    }
}
