//! Working-set reclamation
//!
//! Asks every accessible process to release its resident working set
//! (`EmptyWorkingSet`). Processes are not terminated or suspended; pages are
//! simply returned to the standby list and faulted back in on demand.
//!
//! The sweep never stops on a per-process failure. Only the aggregate tally is
//! reported.

use crate::error::Result;
use crate::monitor::enumerate_pids;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Idle (0) and System (4) pseudo-processes; never attempted, never counted
pub const RESERVED_PIDS: [u32; 2] = [0, 4];

/// Aggregate outcome of a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReclamationResult {
    /// Processes whose working set was trimmed
    pub success_count: u32,
    /// Processes that could not be opened or trimmed
    pub fail_count: u32,
}

impl ReclamationResult {
    /// Processes attempted
    pub fn attempted(&self) -> u32 {
        self.success_count + self.fail_count
    }

    fn record(&mut self, outcome: TrimOutcome) {
        match outcome {
            TrimOutcome::Trimmed => self.success_count += 1,
            TrimOutcome::OpenFailed | TrimOutcome::TrimFailed => self.fail_count += 1,
        }
    }
}

/// Result of trimming one process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimOutcome {
    /// Working set trimmed
    Trimmed,
    /// The process could not be opened (usually access denied)
    OpenFailed,
    /// Opened, but the trim request failed
    TrimFailed,
}

/// Opens a process, trims its working set and releases the handle
pub trait WorkingSetTrimmer {
    /// Trim one process
    fn trim(&self, pid: u32) -> TrimOutcome;
}

impl<T: WorkingSetTrimmer + ?Sized> WorkingSetTrimmer for &T {
    fn trim(&self, pid: u32) -> TrimOutcome {
        (**self).trim(pid)
    }
}

/// Trims real processes through the Win32 API
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrimmer;

impl WorkingSetTrimmer for SystemTrimmer {
    #[cfg(windows)]
    fn trim(&self, pid: u32) -> TrimOutcome {
        windows_impl::trim_working_set(pid)
    }

    #[cfg(not(windows))]
    fn trim(&self, _pid: u32) -> TrimOutcome {
        TrimOutcome::OpenFailed
    }
}

/// Runs reclamation sweeps
pub struct Reclaimer<T: WorkingSetTrimmer = SystemTrimmer> {
    trimmer: T,
    cancel: Option<Arc<AtomicBool>>,
}

impl Reclaimer<SystemTrimmer> {
    /// Reclaimer acting on live processes
    pub fn new() -> Self {
        Self::with_trimmer(SystemTrimmer)
    }
}

impl Default for Reclaimer<SystemTrimmer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WorkingSetTrimmer> Reclaimer<T> {
    /// Reclaimer using `trimmer`
    pub fn with_trimmer(trimmer: T) -> Self {
        Self {
            trimmer,
            cancel: None,
        }
    }

    /// Stop the sweep once `flag` is set
    ///
    /// Checked before each process; identifiers left over are neither
    /// attempted nor counted.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Trim every identifier in `pids` except the reserved ones
    pub fn reclaim_pids<I>(&self, pids: I) -> ReclamationResult
    where
        I: IntoIterator<Item = u32>,
    {
        let mut result = ReclamationResult::default();

        for pid in pids {
            if self.is_cancelled() {
                info!(
                    "Reclamation cancelled after {} processes",
                    result.attempted()
                );
                break;
            }
            if RESERVED_PIDS.contains(&pid) {
                continue;
            }

            let outcome = self.trimmer.trim(pid);
            debug!("pid {}: {:?}", pid, outcome);
            result.record(outcome);
        }

        result
    }

    /// Enumerate live processes and trim them
    pub fn try_reclaim_all(&self) -> Result<ReclamationResult> {
        let pids = enumerate_pids()?;
        let result = self.reclaim_pids(pids);
        info!(
            "Reclamation finished: {} trimmed, {} failed",
            result.success_count, result.fail_count
        );
        Ok(result)
    }

    /// Like [`Reclaimer::try_reclaim_all`], reporting `(0, 0)` if processes
    /// cannot be enumerated
    pub fn reclaim_all(&self) -> ReclamationResult {
        self.try_reclaim_all().unwrap_or_else(|e| {
            error!("Reclamation skipped: {e}");
            ReclamationResult::default()
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Trim every accessible process on the host
pub fn reclaim_all() -> ReclamationResult {
    Reclaimer::new().reclaim_all()
}

#[cfg(windows)]
mod windows_impl {
    use super::TrimOutcome;
    use tracing::debug;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::System::ProcessStatus::EmptyWorkingSet;
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_SET_QUOTA,
    };

    /// RAII guard for a process handle
    struct ProcessHandle(HANDLE);

    impl Drop for ProcessHandle {
        #[expect(unsafe_code, reason = "Windows FFI for CloseHandle")]
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }

    /// # Safety
    ///
    /// `OpenProcess` failures are returned before any use. A successful handle
    /// is owned by `ProcessHandle` and closed exactly once whatever
    /// `EmptyWorkingSet` returns.
    #[expect(
        unsafe_code,
        reason = "Windows FFI for OpenProcess and EmptyWorkingSet"
    )]
    pub(super) fn trim_working_set(pid: u32) -> TrimOutcome {
        let handle = match unsafe {
            OpenProcess(PROCESS_SET_QUOTA | PROCESS_QUERY_INFORMATION, false, pid)
        } {
            Ok(handle) => ProcessHandle(handle),
            Err(e) => {
                debug!("OpenProcess({}) failed: {}", pid, e);
                return TrimOutcome::OpenFailed;
            }
        };

        match unsafe { EmptyWorkingSet(handle.0) } {
            Ok(()) => TrimOutcome::Trimmed,
            Err(e) => {
                debug!("EmptyWorkingSet({}) failed: {}", pid, e);
                TrimOutcome::TrimFailed
            }
        }
    }
}
