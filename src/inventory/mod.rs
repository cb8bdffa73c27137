//! Installed application inventory
//!
//! Enumerates the Windows uninstall stores and produces one
//! [`ApplicationRecord`] per distinct display name.
//!
//! # Scan Order
//!
//! 1. `HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall`
//! 2. `HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall`
//! 3. `HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall`
//!
//! When two entries share a display name, the one seen later wins. Result order
//! is the order in which names were first seen.

pub mod record;
#[cfg(windows)]
pub mod registry;
pub mod scanner;

pub use record::{
    ApplicationRecord, EntryOutcome, FieldOutcome, RawEntry, RawValue, SkipReason, UNKNOWN,
};
pub use scanner::{InventoryReport, InventoryScanner, UninstallRoot, scan_installed_apps};
