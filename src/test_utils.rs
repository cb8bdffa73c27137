#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared helpers for `DustOff` unit tests.

use std::sync::Mutex;
use tempfile::TempDir;

/// Serialises tests that point APPDATA somewhere else
static APPDATA_LOCK: Mutex<()> = Mutex::new(());

/// Fresh temporary directory, removed when dropped
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Points APPDATA at a temporary directory for the guard's lifetime
///
/// # Safety Considerations
///
/// `std::env::set_var` and `remove_var` race with concurrent readers of the
/// environment. Every test that depends on APPDATA takes this guard, which
/// holds `APPDATA_LOCK` until the original value has been restored, so those
/// tests never observe each other's values. Restoration happens in `Drop` and
/// therefore also runs when a test panics.
pub struct AppdataGuard {
    original: Option<String>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[expect(
    unsafe_code,
    reason = "Test-only environment mutation serialised by APPDATA_LOCK"
)]
impl AppdataGuard {
    /// Set APPDATA to `temp_dir` until the guard is dropped
    pub fn new(temp_dir: &TempDir) -> Self {
        let lock = APPDATA_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = std::env::var("APPDATA").ok();
        // SAFETY: APPDATA_LOCK is held; see struct-level documentation.
        unsafe {
            std::env::set_var("APPDATA", temp_dir.path());
        }
        Self {
            original,
            _lock: lock,
        }
    }
}

#[expect(
    unsafe_code,
    reason = "Test-only environment restoration serialised by APPDATA_LOCK"
)]
impl Drop for AppdataGuard {
    fn drop(&mut self) {
        // SAFETY: the lock is still held; it is released after this body runs.
        unsafe {
            match &self.original {
                Some(original) => std::env::set_var("APPDATA", original),
                None => std::env::remove_var("APPDATA"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sets_appdata() {
        let dir = create_test_dir();
        let _guard = AppdataGuard::new(&dir);
        assert_eq!(
            std::env::var("APPDATA").unwrap(),
            dir.path().to_string_lossy()
        );
    }
}
