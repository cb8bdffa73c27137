//! Point-in-time process snapshot
//!
//! Enumerates live processes with the Toolhelp32 API and groups process
//! identifiers by normalised executable name (lowercase, `.exe` stripped).
//! A snapshot only describes the instant it was taken; take a new one for
//! fresh state.

use smallvec::SmallVec;
use std::collections::HashMap;

#[cfg(windows)]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};

#[cfg(windows)]
use windows::Win32::Foundation::{CloseHandle, ERROR_NO_MORE_FILES, HANDLE};

use crate::error::Result;

/// Identifiers sharing one process name; almost always one or two
pub type PidList = SmallVec<[u32; 4]>;

/// One live process as reported by the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// Process identifier
    pub pid: u32,
    /// Executable file name as reported (e.g. `Code.exe`)
    pub exe_name: String,
}

/// Normalised process name → identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSnapshot {
    by_name: HashMap<String, PidList>,
}

impl ProcessSnapshot {
    /// Build a snapshot from `(executable name, pid)` pairs
    ///
    /// Names are normalised; duplicate pairs collapse.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut by_name: HashMap<String, PidList> = HashMap::new();
        for (name, pid) in entries {
            let pids = by_name.entry(normalize_process_name(name.as_ref())).or_default();
            if !pids.contains(&pid) {
                pids.push(pid);
            }
        }
        Self { by_name }
    }

    /// Capture the live process list
    pub fn capture() -> Result<Self> {
        let entries = enumerate_processes()?;
        let snapshot = Self::from_entries(entries.into_iter().map(|e| (e.exe_name, e.pid)));
        tracing::debug!(
            "Process snapshot: {} processes under {} names",
            snapshot.process_count(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Identifiers for a normalised name; empty when absent
    pub fn pids(&self, name: &str) -> &[u32] {
        self.by_name
            .get(name)
            .map(|pids| pids.as_slice())
            .unwrap_or(&[])
    }

    /// Whether any process has this normalised name
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterate `(name, pids)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.by_name
            .iter()
            .map(|(name, pids)| (name.as_str(), pids.as_slice()))
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Total number of processes
    pub fn process_count(&self) -> usize {
        self.by_name.values().map(SmallVec::len).sum()
    }
}

/// Take a process snapshot, or an empty one if enumeration fails
pub fn take_snapshot() -> ProcessSnapshot {
    ProcessSnapshot::capture().unwrap_or_else(|e| {
        tracing::error!("Process snapshot failed: {e}");
        ProcessSnapshot::default()
    })
}

/// Identifiers of every live process
pub fn enumerate_pids() -> Result<Vec<u32>> {
    Ok(enumerate_processes()?.into_iter().map(|e| e.pid).collect())
}

/// Enumerate live processes
///
/// # Safety
///
/// `CreateToolhelp32Snapshot` called with valid flags (`TH32CS_SNAPPROCESS`, PID 0).
/// Return value validated via `map_err`; errors propagated. Handle wrapped in
/// `SnapshotGuard` (RAII) for cleanup. `PROCESSENTRY32W` initialized with correct
/// `dwSize` to prevent buffer overruns. `Process32FirstW`/`NextW` return codes checked
/// before data access; `ERROR_NO_MORE_FILES` handled as iteration end.
#[cfg(windows)]
#[expect(
    unsafe_code,
    reason = "Windows FFI for process enumeration via CreateToolhelp32Snapshot and Process32FirstW/NextW"
)]
pub fn enumerate_processes() -> Result<Vec<ProcessEntry>> {
    use crate::error::DustOffError;
    use tracing::warn;

    // Typical Windows system has 150-250 processes
    const DEFAULT_PROCESS_COUNT: usize = 256;

    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0).map_err(|e| {
            tracing::error!("Windows API error - CreateToolhelp32Snapshot failed: {e}");
            DustOffError::ProcessEnumerationError(Box::new(e))
        })?
    };
    let _guard = SnapshotGuard(snapshot);

    let mut processes = Vec::with_capacity(DEFAULT_PROCESS_COUNT);

    #[expect(
        clippy::cast_possible_truncation,
        reason = "size_of::<PROCESSENTRY32W>() is a compile-time constant (568 bytes) that fits in u32"
    )]
    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut has_process = unsafe { Process32FirstW(snapshot, &raw mut entry).is_ok() };

    while has_process {
        processes.push(ProcessEntry {
            pid: entry.th32ProcessID,
            exe_name: wide_to_string(&entry.szExeFile),
        });

        has_process = unsafe {
            match Process32NextW(snapshot, &raw mut entry) {
                Ok(()) => true,
                Err(e) => {
                    if e.code() != ERROR_NO_MORE_FILES.to_hresult() {
                        warn!("Error iterating processes: {e}");
                    }
                    false
                }
            }
        };
    }

    Ok(processes)
}

/// Enumerate live processes (unsupported on this platform)
#[cfg(not(windows))]
pub fn enumerate_processes() -> Result<Vec<ProcessEntry>> {
    Err(crate::error::DustOffError::UnsupportedPlatform(
        "Process enumeration",
    ))
}

/// RAII guard for the Toolhelp snapshot handle
#[cfg(windows)]
struct SnapshotGuard(HANDLE);

#[cfg(windows)]
impl Drop for SnapshotGuard {
    /// # Safety
    ///
    /// Guard owns the handle returned by `CreateToolhelp32Snapshot` and closes it once.
    #[expect(
        unsafe_code,
        reason = "Windows FFI for CloseHandle to release snapshot handle"
    )]
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Convert a null-terminated `szExeFile` buffer
///
/// Lossy, so a process with a malformed name is still listed under its pid.
#[cfg(any(windows, test))]
fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

/// Normalise an executable name for matching
///
/// Lowercases, drops any directory part and strips a trailing `.exe`.
///
/// Examples:
/// - "C:\\Windows\\System32\\notepad.exe" -> "notepad"
/// - "Code.EXE" -> "code"
/// - "my.app.exe" -> "my.app"
pub fn normalize_process_name(name: &str) -> String {
    let filename = name.rsplit(['\\', '/']).next().unwrap_or(name);
    let lower = filename.to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}
