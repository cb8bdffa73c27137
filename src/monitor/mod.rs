//! Process snapshot and application correlation
//!
//! `ProcessSnapshot` groups live process identifiers by normalised executable
//! name; `Correlator` maps an installed application's display name onto that
//! snapshot.
//!
//! **Limitation:** correlation is heuristic. Processes are matched by executable
//! name only, so unrelated programs sharing a name are reported as running.

pub mod correlator;
pub mod process_snapshot;

pub use correlator::{CURATED_ALIASES, Correlation, Correlator, MatchTier, find_pids};
pub use process_snapshot::{
    PidList, ProcessEntry, ProcessSnapshot, enumerate_pids, enumerate_processes,
    normalize_process_name, take_snapshot,
};
