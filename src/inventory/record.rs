//! Installed application records and per-field extraction
//!
//! Every optional registry value is read independently and resolved to a
//! [`FieldOutcome`], so a missing or oddly typed value only ever affects its own
//! field. Whole entries resolve to an [`EntryOutcome`].

use serde::Serialize;
use std::collections::HashMap;

/// Sentinel used for absent version, publisher and install date values
pub const UNKNOWN: &str = "unknown";

/// Registry value holding the application's display name (required)
pub const DISPLAY_NAME: &str = "DisplayName";
/// Registry value holding the version string
pub const DISPLAY_VERSION: &str = "DisplayVersion";
/// Registry value holding the publisher
pub const PUBLISHER: &str = "Publisher";
/// Registry value holding the install date (`YYYYMMDD` when well formed)
pub const INSTALL_DATE: &str = "InstallDate";
/// Registry value holding the uninstall command line
pub const UNINSTALL_STRING: &str = "UninstallString";
/// Registry value holding the estimated size in kilobytes
pub const ESTIMATED_SIZE: &str = "EstimatedSize";
/// Registry value holding the icon location (`path[,index]`)
pub const DISPLAY_ICON: &str = "DisplayIcon";

/// All values read from an uninstall entry
pub const VALUE_NAMES: [&str; 7] = [
    DISPLAY_NAME,
    DISPLAY_VERSION,
    PUBLISHER,
    INSTALL_DATE,
    UNINSTALL_STRING,
    ESTIMATED_SIZE,
    DISPLAY_ICON,
];

/// One discovered installed application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRecord {
    /// Display name, never empty; unique within a scan result
    pub name: String,
    /// Version string or [`UNKNOWN`]
    pub version: String,
    /// Publisher or [`UNKNOWN`]
    pub publisher: String,
    /// `YYYY-MM-DD`, the verbatim source value when malformed, or [`UNKNOWN`]
    pub install_date: String,
    /// Uninstall command line, possibly empty
    pub uninstall_command: String,
    /// Estimated size in megabytes rounded to 2 decimals, 0 when unavailable
    pub estimated_size_mb: f64,
    /// Icon location, possibly empty, possibly carrying a `,index` suffix
    pub icon_path: String,
}

/// A registry value as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// `REG_SZ` / `REG_EXPAND_SZ`
    Text(String),
    /// `REG_DWORD` / `REG_QWORD`
    Number(u64),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        Self::Number(u64::from(value))
    }
}

impl From<u64> for RawValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// The values of one uninstall subkey
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    /// Subkey name, reported for entries that are skipped
    pub key_name: String,
    values: HashMap<String, RawValue>,
}

impl RawEntry {
    /// Create an empty entry for the given subkey
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            values: HashMap::new(),
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a value
    pub fn insert(&mut self, name: &str, value: impl Into<RawValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }
}

/// Result of extracting one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    /// The value was present and usable
    Found(T),
    /// The value was absent or unusable; the documented default was applied
    Defaulted(T),
}

impl<T> FieldOutcome<T> {
    /// Unwrap the resolved value regardless of how it was obtained
    pub fn into_value(self) -> T {
        match self {
            Self::Found(value) | Self::Defaulted(value) => value,
        }
    }

    /// Whether the default was applied
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}

/// Why an entry contributed no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No usable `DisplayName`; not a real application entry
    MissingDisplayName,
}

/// Result of turning one registry entry into a record
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// A complete record
    Record(ApplicationRecord),
    /// The entry was skipped
    Skipped(SkipReason),
}

/// Build a record from one entry's values
pub fn record_from_entry(entry: &RawEntry) -> EntryOutcome {
    let name = match entry.get(DISPLAY_NAME) {
        Some(RawValue::Text(name)) if !name.trim().is_empty() => name.clone(),
        Some(RawValue::Number(n)) => n.to_string(),
        _ => return EntryOutcome::Skipped(SkipReason::MissingDisplayName),
    };

    EntryOutcome::Record(ApplicationRecord {
        name,
        version: text_field(entry, DISPLAY_VERSION, UNKNOWN).into_value(),
        publisher: text_field(entry, PUBLISHER, UNKNOWN).into_value(),
        install_date: install_date_field(entry).into_value(),
        uninstall_command: text_field(entry, UNINSTALL_STRING, "").into_value(),
        estimated_size_mb: size_field(entry).into_value(),
        icon_path: text_field(entry, DISPLAY_ICON, "").into_value(),
    })
}

/// Read a text value, rendering numeric values as decimal text
pub fn text_field(entry: &RawEntry, name: &str, default: &str) -> FieldOutcome<String> {
    match entry.get(name) {
        Some(RawValue::Text(text)) => FieldOutcome::Found(text.clone()),
        Some(RawValue::Number(n)) => FieldOutcome::Found(n.to_string()),
        None => FieldOutcome::Defaulted(default.to_string()),
    }
}

/// Read and normalise `InstallDate`
pub fn install_date_field(entry: &RawEntry) -> FieldOutcome<String> {
    match text_field(entry, INSTALL_DATE, UNKNOWN) {
        FieldOutcome::Found(raw) => FieldOutcome::Found(normalize_install_date(&raw)),
        defaulted @ FieldOutcome::Defaulted(_) => defaulted,
    }
}

/// Read `EstimatedSize` (kilobytes) as megabytes
pub fn size_field(entry: &RawEntry) -> FieldOutcome<f64> {
    match entry.get(ESTIMATED_SIZE) {
        Some(RawValue::Number(kb)) => FieldOutcome::Found(kb_to_mb(*kb)),
        Some(RawValue::Text(text)) => match text.trim().parse::<u64>() {
            Ok(kb) => FieldOutcome::Found(kb_to_mb(kb)),
            Err(_) => FieldOutcome::Defaulted(0.0),
        },
        None => FieldOutcome::Defaulted(0.0),
    }
}

/// Reformat an 8-digit `YYYYMMDD` date as `YYYY-MM-DD`
///
/// Any other shape is returned unchanged.
pub fn normalize_install_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
    } else {
        raw.to_string()
    }
}

/// Convert kilobytes to megabytes rounded to 2 decimal places, ties to even
#[expect(
    clippy::cast_precision_loss,
    reason = "Installed sizes are far below 2^52 KB; rounding to 2 decimals anyway"
)]
pub fn kb_to_mb(kb: u64) -> f64 {
    (kb as f64 / 1024.0 * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_date_eight_digits_is_dashed() {
        assert_eq!(normalize_install_date("20230115"), "2023-01-15");
    }

    #[test]
    fn install_date_other_shapes_pass_through() {
        assert_eq!(normalize_install_date("2023-01-15"), "2023-01-15");
        assert_eq!(normalize_install_date("1/15/2023"), "1/15/2023");
        assert_eq!(normalize_install_date("2023011"), "2023011");
        assert_eq!(normalize_install_date("2023O115"), "2023O115");
        assert_eq!(normalize_install_date(""), "");
    }

    #[test]
    fn install_date_absent_is_unknown() {
        let entry = RawEntry::new("k");
        let outcome = install_date_field(&entry);
        assert!(outcome.is_defaulted());
        assert_eq!(outcome.into_value(), UNKNOWN);
    }

    #[test]
    fn install_date_numeric_value_is_normalised() {
        let entry = RawEntry::new("k").with(INSTALL_DATE, 20_210_301_u32);
        assert_eq!(install_date_field(&entry).into_value(), "2021-03-01");
    }

    #[test]
    fn size_conversion() {
        assert!((kb_to_mb(2048) - 2.0).abs() < f64::EPSILON);
        assert!((kb_to_mb(1536) - 1.5).abs() < f64::EPSILON);
        assert!((kb_to_mb(1000) - 0.98).abs() < f64::EPSILON);
        assert!(kb_to_mb(0).abs() < f64::EPSILON);
    }

    #[test]
    fn size_conversion_rounds_half_to_even() {
        // 128 KB is exactly 12.5 hundredths of a MB, 640 KB is 62.5
        assert!((kb_to_mb(128) - 0.12).abs() < f64::EPSILON);
        assert!((kb_to_mb(640) - 0.62).abs() < f64::EPSILON);
        assert!((kb_to_mb(384) - 0.38).abs() < f64::EPSILON);
        assert!((kb_to_mb(896) - 0.88).abs() < f64::EPSILON);
    }

    #[test]
    fn size_absent_or_garbage_is_zero() {
        let absent = RawEntry::new("k");
        assert_eq!(size_field(&absent), FieldOutcome::Defaulted(0.0));

        let garbage = RawEntry::new("k").with(ESTIMATED_SIZE, "lots");
        assert_eq!(size_field(&garbage), FieldOutcome::Defaulted(0.0));

        let textual = RawEntry::new("k").with(ESTIMATED_SIZE, "2048");
        assert_eq!(size_field(&textual), FieldOutcome::Found(2.0));
    }

    #[test]
    fn missing_display_name_is_skipped() {
        let entry = RawEntry::new("KB123456").with(DISPLAY_VERSION, "1.0");
        assert_eq!(
            record_from_entry(&entry),
            EntryOutcome::Skipped(SkipReason::MissingDisplayName)
        );
    }

    #[test]
    fn blank_display_name_is_skipped() {
        let entry = RawEntry::new("k").with(DISPLAY_NAME, "   ");
        assert!(matches!(
            record_from_entry(&entry),
            EntryOutcome::Skipped(SkipReason::MissingDisplayName)
        ));
    }

    #[test]
    fn optional_fields_default_independently() {
        let entry = RawEntry::new("k")
            .with(DISPLAY_NAME, "Tool")
            .with(PUBLISHER, "Acme");

        let EntryOutcome::Record(record) = record_from_entry(&entry) else {
            panic!("expected a record");
        };
        assert_eq!(record.name, "Tool");
        assert_eq!(record.publisher, "Acme");
        assert_eq!(record.version, UNKNOWN);
        assert_eq!(record.install_date, UNKNOWN);
        assert_eq!(record.uninstall_command, "");
        assert_eq!(record.icon_path, "");
        assert!(record.estimated_size_mb.abs() < f64::EPSILON);
    }

    #[test]
    fn full_entry_maps_every_field() {
        let entry = RawEntry::new("{GUID}")
            .with(DISPLAY_NAME, "Editor")
            .with(DISPLAY_VERSION, "2.4.1")
            .with(PUBLISHER, "Editor Corp")
            .with(INSTALL_DATE, "20240229")
            .with(UNINSTALL_STRING, "\"C:\\Editor\\uninst.exe\" /S")
            .with(ESTIMATED_SIZE, 10_240_u32)
            .with(DISPLAY_ICON, "C:\\Editor\\editor.exe,0");

        let EntryOutcome::Record(record) = record_from_entry(&entry) else {
            panic!("expected a record");
        };
        assert_eq!(record.version, "2.4.1");
        assert_eq!(record.install_date, "2024-02-29");
        assert_eq!(record.uninstall_command, "\"C:\\Editor\\uninst.exe\" /S");
        assert!((record.estimated_size_mb - 10.0).abs() < f64::EPSILON);
        assert_eq!(record.icon_path, "C:\\Editor\\editor.exe,0");
    }
}
