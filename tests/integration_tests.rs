//! End-to-end tests across modules
//!
//! Mirrors what the command line front end does: load configuration, scan an
//! inventory, correlate it with a process snapshot and resolve icons.

use dustoff::config::{AppConfig, ConfigManager};
use dustoff::inventory::{InventoryScanner, RawEntry, UninstallRoot};
use dustoff::monitor::{Correlator, ProcessSnapshot};
use dustoff::utils::{IconImage, IconResolver, IconSource};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use tempfile::TempDir;

struct FixedRoot(Vec<RawEntry>);

impl UninstallRoot for FixedRoot {
    fn location(&self) -> &str {
        "fixture"
    }

    fn read_entries(&self) -> io::Result<Vec<io::Result<RawEntry>>> {
        Ok(self.0.iter().cloned().map(Ok).collect())
    }
}

/// Every path exists; only `.exe` files carry an icon
struct ExeOnly;

impl IconSource for ExeOnly {
    fn exists(&self, _path: &Path) -> bool {
        true
    }

    fn extract(&self, path: &Path, _index: i32) -> Option<IconImage> {
        let is_exe = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
        is_exe.then(IconImage::placeholder)
    }
}

fn fixture_inventory() -> InventoryScanner {
    InventoryScanner::new(vec![Box::new(FixedRoot(vec![
        RawEntry::new("{chrome}")
            .with("DisplayName", "Google Chrome")
            .with("DisplayIcon", r"C:\Program Files\Google\Chrome\chrome.exe,0"),
        RawEntry::new("teams")
            .with("DisplayName", "Microsoft Teams")
            .with("DisplayIcon", r"C:\Users\me\AppData\Local\Teams\icon.ico"),
        RawEntry::new("orphan").with("DisplayName", "Unused Utility"),
    ]))])
}

#[test]
fn configured_aliases_flow_into_correlation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = dir.path().join("config.json");

    let mut config = AppConfig::default();
    config
        .process_aliases
        .insert("Microsoft Teams".to_string(), "ms-teams".to_string());
    ConfigManager::save_to(&config, &config_path).unwrap();

    let loaded = ConfigManager::load_from(&config_path).unwrap();
    let correlator = Correlator::with_extra_aliases(&loaded.process_aliases);

    let snapshot = ProcessSnapshot::from_entries([
        ("chrome.exe", 10),
        ("ms-teams.exe", 20),
        ("explorer.exe", 30),
    ]);

    let running: Vec<(String, BTreeSet<u32>)> = fixture_inventory()
        .scan()
        .into_iter()
        .map(|record| {
            let pids = correlator.find_pids(&record.name, &snapshot);
            (record.name, pids)
        })
        .collect();

    assert_eq!(
        running,
        [
            ("Google Chrome".to_string(), BTreeSet::from([10])),
            ("Microsoft Teams".to_string(), BTreeSet::from([20])),
            ("Unused Utility".to_string(), BTreeSet::new()),
        ]
    );
}

#[test]
fn inventory_icons_resolve_or_degrade() {
    let resolver = IconResolver::with_source(ExeOnly);

    let outcomes: Vec<_> = fixture_inventory()
        .scan()
        .iter()
        .map(|record| resolver.resolve(&record.icon_path, true))
        .collect();

    assert!(matches!(outcomes[0], dustoff::Icon::Extracted(_)));
    assert!(outcomes[1].is_fallback());
    // No DisplayIcon at all
    assert!(outcomes[2].is_fallback());

    let stats = resolver.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.extracted, 1);
    assert_eq!(stats.failed, 1);
}

#[test]
fn top_level_entry_points_never_fail() {
    // These are safe to call on any platform; off Windows they are empty.
    let apps = dustoff::scan_installed_apps();
    let snapshot = dustoff::take_snapshot();
    for app in &apps {
        let _ = dustoff::find_pids(&app.name, &snapshot);
    }

    if cfg!(windows) {
        assert!(!snapshot.is_empty());
    } else {
        assert!(apps.is_empty());
        assert!(snapshot.is_empty());
    }
}
