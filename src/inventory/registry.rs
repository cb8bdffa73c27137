//! Registry-backed uninstall roots

use super::record::{RawEntry, RawValue, VALUE_NAMES};
use super::scanner::UninstallRoot;
use std::io;
use tracing::debug;
use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_64KEY};

/// Uninstall key in the native registry view
pub const UNINSTALL_PATH: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";

/// Uninstall key for 32-bit applications on 64-bit Windows
pub const UNINSTALL_PATH_WOW64: &str =
    r"SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall";

/// Registry hive an uninstall root lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    /// `HKEY_LOCAL_MACHINE`
    LocalMachine,
    /// `HKEY_CURRENT_USER`
    CurrentUser,
}

impl Hive {
    fn open(self) -> RegKey {
        match self {
            Self::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
            Self::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::LocalMachine => "HKLM",
            Self::CurrentUser => "HKCU",
        }
    }
}

/// An uninstall key in the registry
#[derive(Debug, Clone)]
pub struct RegistryRoot {
    hive: Hive,
    path: &'static str,
    location: String,
}

impl RegistryRoot {
    /// Root at `hive\path`
    pub fn new(hive: Hive, path: &'static str) -> Self {
        Self {
            hive,
            path,
            location: format!("{}\\{}", hive.prefix(), path),
        }
    }
}

impl UninstallRoot for RegistryRoot {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_entries(&self) -> io::Result<Vec<io::Result<RawEntry>>> {
        // Always read the 64-bit view so a 32-bit build sees the same keys
        let flags = KEY_READ | KEY_WOW64_64KEY;
        let root = self.hive.open().open_subkey_with_flags(self.path, flags)?;

        let entries: Vec<io::Result<RawEntry>> = root
            .enum_keys()
            .map(|name| -> io::Result<RawEntry> {
                let name = name?;
                let key = root.open_subkey_with_flags(&name, flags)?;
                Ok(read_entry(name, &key))
            })
            .collect();

        Ok(entries)
    }
}

/// The three uninstall roots in scan order
pub fn default_roots() -> Vec<Box<dyn UninstallRoot>> {
    vec![
        Box::new(RegistryRoot::new(Hive::LocalMachine, UNINSTALL_PATH)),
        Box::new(RegistryRoot::new(Hive::LocalMachine, UNINSTALL_PATH_WOW64)),
        Box::new(RegistryRoot::new(Hive::CurrentUser, UNINSTALL_PATH)),
    ]
}

fn read_entry(key_name: String, key: &RegKey) -> RawEntry {
    let mut entry = RawEntry::new(key_name);
    for name in VALUE_NAMES {
        if let Some(value) = read_value(key, name) {
            entry.insert(name, value);
        }
    }
    entry
}

/// Read a value as text, then as a DWORD, then as a QWORD
fn read_value(key: &RegKey, name: &str) -> Option<RawValue> {
    match key.get_value::<String, _>(name) {
        Ok(text) => return Some(RawValue::Text(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(_) => {}
    }

    if let Ok(dword) = key.get_value::<u32, _>(name) {
        return Some(RawValue::Number(u64::from(dword)));
    }

    match key.get_value::<u64, _>(name) {
        Ok(qword) => Some(RawValue::Number(qword)),
        Err(e) => {
            debug!("Ignoring unsupported value type for {}: {}", name, e);
            None
        }
    }
}
