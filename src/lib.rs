//! `DustOff` - installed application inventory and memory housekeeping for Windows
//!
//! Four independent building blocks, all synchronous and blocking:
//!
//! - [`inventory`]: installed applications from the registry uninstall keys,
//!   deduplicated by display name.
//! - [`monitor`]: a point-in-time process snapshot and a heuristic mapping from
//!   application names to running process identifiers.
//! - [`utils::icon_cache`]: icon extraction from executables with a per-resolver
//!   cache and a shared fallback image.
//! - [`memory`]: working-set trimming across every accessible process.
//!
//! Per-item failures (an unreadable key, a protected process, a broken icon)
//! are absorbed into defaults and counters; only whole-source failures surface
//! as [`DustOffError`].
//!
//! # Requirements
//!
//! - Windows 10 or later. On other platforms the crate builds, the inventory is
//!   empty and process operations report `UnsupportedPlatform`.

pub mod config;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod monitor;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use error::{DustOffError, Result};
pub use inventory::{ApplicationRecord, scan_installed_apps};
pub use memory::{ReclamationResult, reclaim_all};
pub use monitor::{ProcessSnapshot, find_pids, take_snapshot};
pub use utils::icon_cache::{Icon, IconResolver};
