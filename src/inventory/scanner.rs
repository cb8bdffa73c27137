//! Inventory scan over the uninstall stores
//!
//! Roots are visited in the order they were given. A root that cannot be
//! opened, or a subkey that cannot be read, contributes nothing and is only
//! logged. Records are deduplicated by display name: a later entry replaces the
//! fields of an earlier one but keeps the earlier one's position.

use super::record::{ApplicationRecord, EntryOutcome, RawEntry, SkipReason, record_from_entry};
use std::collections::HashMap;
use std::io;
use tracing::{debug, info, warn};

/// One application-registration store (e.g. a registry uninstall key)
pub trait UninstallRoot {
    /// Human readable location, used for logging
    fn location(&self) -> &str;

    /// Read every entry under the root
    ///
    /// The outer error means the root itself is unavailable; inner errors mark
    /// individual entries that vanished or could not be opened.
    fn read_entries(&self) -> io::Result<Vec<io::Result<RawEntry>>>;
}

/// Records plus accounting for one scan
#[derive(Debug, Clone, Default)]
pub struct InventoryReport {
    /// Deduplicated records in first-seen order
    pub records: Vec<ApplicationRecord>,
    /// Roots that could not be opened
    pub roots_unavailable: usize,
    /// Entries enumerated across all roots
    pub entries_seen: usize,
    /// Entries without a usable `DisplayName`
    pub entries_without_name: usize,
    /// Subkey names of those entries (update packages, hidden components)
    pub unnamed_keys: Vec<String>,
    /// Entries that could not be read
    pub entries_unreadable: usize,
    /// Records replaced by a later entry with the same name
    pub duplicates_replaced: usize,
}

/// Scans a fixed, ordered list of roots
pub struct InventoryScanner {
    roots: Vec<Box<dyn UninstallRoot>>,
}

impl InventoryScanner {
    /// Create a scanner over the given roots, visited in order
    pub fn new(roots: Vec<Box<dyn UninstallRoot>>) -> Self {
        Self { roots }
    }

    /// Scanner over the host's uninstall stores
    ///
    /// Order: HKLM 64-bit view, HKLM 32-bit view, HKCU. Empty on other platforms.
    pub fn system() -> Self {
        #[cfg(windows)]
        {
            Self::new(super::registry::default_roots())
        }

        #[cfg(not(windows))]
        {
            debug!("Registry inventory not available on this platform");
            Self::new(Vec::new())
        }
    }

    /// Number of roots this scanner visits
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Scan and return the deduplicated records
    pub fn scan(&self) -> Vec<ApplicationRecord> {
        self.scan_with_report().records
    }

    /// Scan and return records with accounting
    pub fn scan_with_report(&self) -> InventoryReport {
        let mut report = InventoryReport::default();
        let mut collected = Vec::new();

        for root in &self.roots {
            let entries = match root.read_entries() {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping uninstall root {}: {}", root.location(), e);
                    report.roots_unavailable += 1;
                    continue;
                }
            };

            debug!("{} entries under {}", entries.len(), root.location());

            for entry in entries {
                report.entries_seen += 1;

                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!("Unreadable entry under {}: {}", root.location(), e);
                        report.entries_unreadable += 1;
                        continue;
                    }
                };

                match record_from_entry(&entry) {
                    EntryOutcome::Record(record) => collected.push(record),
                    EntryOutcome::Skipped(SkipReason::MissingDisplayName) => {
                        debug!("No DisplayName: {}\\{}", root.location(), entry.key_name);
                        report.entries_without_name += 1;
                        report.unnamed_keys.push(entry.key_name);
                    }
                }
            }
        }

        let (records, replaced) = dedup_by_name(collected);
        report.records = records;
        report.duplicates_replaced = replaced;

        info!(
            "Inventory scan: {} applications from {} entries ({} unnamed, {} unreadable, {} roots unavailable)",
            report.records.len(),
            report.entries_seen,
            report.entries_without_name,
            report.entries_unreadable,
            report.roots_unavailable
        );

        report
    }
}

/// Scan the host's uninstall stores
pub fn scan_installed_apps() -> Vec<ApplicationRecord> {
    InventoryScanner::system().scan()
}

/// Deduplicate by name, last writer wins, first-seen position kept
///
/// Returns the records and how many were replaced.
pub fn dedup_by_name(records: Vec<ApplicationRecord>) -> (Vec<ApplicationRecord>, usize) {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<ApplicationRecord> = Vec::with_capacity(records.len());
    let mut replaced = 0;

    for record in records {
        if let Some(&pos) = positions.get(&record.name) {
            unique[pos] = record;
            replaced += 1;
        } else {
            positions.insert(record.name.clone(), unique.len());
            unique.push(record);
        }
    }

    (unique, replaced)
}
