//! Installed application → running process correlation
//!
//! A conservative heuristic, not an exact mapping. Two tiers, first hit wins:
//!
//! 1. **Curated aliases**: marketing name fragments mapped to executable names
//!    (`"visual studio code"` → `code`). Every alias whose key occurs in the
//!    lowercased display name contributes the pids of its process.
//! 2. **Word match**: a process matches if its name equals one whitespace
//!    separated word of the display name, or the whole display name with spaces
//!    removed.
//!
//! Nothing here does I/O; the same snapshot can be reused for every application.

use super::process_snapshot::ProcessSnapshot;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Built-in marketing name → process name table
pub const CURATED_ALIASES: &[(&str, &str)] = &[
    ("google chrome", "chrome"),
    ("microsoft edge", "msedge"),
    ("firefox", "firefox"),
    ("discord", "discord"),
    ("spotify", "spotify"),
    ("notepad", "notepad"),
    ("calculator", "calculator"),
    ("visual studio code", "code"),
    ("vlc media player", "vlc"),
];

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Curated alias table
    Alias,
    /// Exact word or compacted-name equality
    Word,
}

/// Correlation result for one application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlation {
    /// Tier that matched, `None` when nothing did
    pub tier: Option<MatchTier>,
    /// Matching process identifiers
    pub pids: BTreeSet<u32>,
}

impl Correlation {
    /// Whether any process matched
    pub fn is_running(&self) -> bool {
        !self.pids.is_empty()
    }
}

/// Correlates display names with snapshot entries
#[derive(Debug, Clone)]
pub struct Correlator {
    aliases: Vec<(String, String)>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self {
            aliases: CURATED_ALIASES
                .iter()
                .map(|(key, process)| ((*key).to_string(), (*process).to_string()))
                .collect(),
        }
    }
}

impl Correlator {
    /// Correlator with the built-in alias table
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in aliases followed by `extra`
    ///
    /// Keys and process names are lowercased; entries with an empty side are dropped.
    pub fn with_extra_aliases<I, K, V>(extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut correlator = Self::default();
        for (key, process) in extra {
            let key = key.as_ref().trim().to_lowercase();
            let process = process.as_ref().trim().to_lowercase();
            if key.is_empty() || process.is_empty() {
                tracing::warn!("Ignoring incomplete process alias {key:?} -> {process:?}");
                continue;
            }
            correlator.aliases.push((key, process));
        }
        correlator
    }

    /// Alias table in evaluation order
    pub fn aliases(&self) -> &[(String, String)] {
        &self.aliases
    }

    /// Identifiers of processes believed to belong to `display_name`
    pub fn find_pids(&self, display_name: &str, snapshot: &ProcessSnapshot) -> BTreeSet<u32> {
        self.correlate(display_name, snapshot).pids
    }

    /// Like [`Correlator::find_pids`], also reporting the tier that matched
    pub fn correlate(&self, display_name: &str, snapshot: &ProcessSnapshot) -> Correlation {
        let name = display_name.to_lowercase();
        if name.trim().is_empty() {
            return Correlation::default();
        }

        let aliased = self.alias_matches(&name, snapshot);
        if !aliased.is_empty() {
            return Correlation {
                tier: Some(MatchTier::Alias),
                pids: aliased,
            };
        }

        let worded = word_matches(&name, snapshot);
        Correlation {
            tier: (!worded.is_empty()).then_some(MatchTier::Word),
            pids: worded,
        }
    }

    fn alias_matches(&self, name: &str, snapshot: &ProcessSnapshot) -> BTreeSet<u32> {
        self.aliases
            .iter()
            .filter(|(key, _)| name.contains(key.as_str()))
            .flat_map(|(_, process)| snapshot.pids(process).iter().copied())
            .collect()
    }
}

fn word_matches(name: &str, snapshot: &ProcessSnapshot) -> BTreeSet<u32> {
    let words: HashSet<&str> = name.split_whitespace().collect();
    let compact = name.replace(' ', "");

    snapshot
        .iter()
        .filter(|(process, _)| words.contains(process) || *process == compact)
        .flat_map(|(_, pids)| pids.iter().copied())
        .collect()
}

static DEFAULT_CORRELATOR: LazyLock<Correlator> = LazyLock::new(Correlator::default);

/// Correlate with the built-in alias table
pub fn find_pids(display_name: &str, snapshot: &ProcessSnapshot) -> BTreeSet<u32> {
    DEFAULT_CORRELATOR.find_pids(display_name, snapshot)
}
