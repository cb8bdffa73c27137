//! System-wide physical memory status

use crate::error::Result;
use serde::Serialize;

const MB: u64 = 1024 * 1024;

/// Physical memory totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryStatus {
    /// Installed physical memory
    pub total_bytes: u64,
    /// Physical memory available to processes
    pub available_bytes: u64,
    /// `total_bytes - available_bytes`
    pub used_bytes: u64,
    /// Share of physical memory in use, 0.0 to 100.0
    pub percent_used: f64,
}

impl MemoryStatus {
    /// Derive used memory and load from the two physical totals
    #[expect(
        clippy::cast_precision_loss,
        reason = "percentage only needs a few significant digits"
    )]
    pub fn from_physical(total_bytes: u64, available_bytes: u64) -> Self {
        let available_bytes = available_bytes.min(total_bytes);
        let used_bytes = total_bytes - available_bytes;
        let percent_used = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 * 100.0 / total_bytes as f64
        };

        Self {
            total_bytes,
            available_bytes,
            used_bytes,
            percent_used,
        }
    }

    /// Used memory in MiB
    pub fn used_mb(&self) -> u64 {
        self.used_bytes / MB
    }

    /// Available memory in MiB
    pub fn available_mb(&self) -> u64 {
        self.available_bytes / MB
    }
}

/// Query physical memory via `GlobalMemoryStatusEx`
///
/// # Safety
///
/// `MEMORYSTATUSEX` is initialised with its own size in `dwLength` as the API
/// requires, and the pointer is valid for the duration of the call.
#[cfg(windows)]
#[expect(unsafe_code, reason = "Windows FFI for GlobalMemoryStatusEx")]
pub fn memory_status() -> Result<MemoryStatus> {
    use windows::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

    #[expect(
        clippy::cast_possible_truncation,
        reason = "size_of::<MEMORYSTATUSEX>() is a compile-time constant (64 bytes) well within u32::MAX"
    )]
    let mut status = MEMORYSTATUSEX {
        dwLength: std::mem::size_of::<MEMORYSTATUSEX>() as u32,
        ..Default::default()
    };

    unsafe { GlobalMemoryStatusEx(&raw mut status)? };

    Ok(MemoryStatus::from_physical(
        status.ullTotalPhys,
        status.ullAvailPhys,
    ))
}

/// Query physical memory (unsupported on this platform)
#[cfg(not(windows))]
pub fn memory_status() -> Result<MemoryStatus> {
    Err(crate::error::DustOffError::UnsupportedPlatform(
        "Memory status",
    ))
}
