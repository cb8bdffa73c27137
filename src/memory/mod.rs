//! Memory reclamation
//!
//! Working-set trimming across all processes, plus a system memory readout
//! for before/after comparisons.

pub mod reclaim;
pub mod status;

pub use reclaim::{
    RESERVED_PIDS, ReclamationResult, Reclaimer, SystemTrimmer, TrimOutcome, WorkingSetTrimmer,
    reclaim_all,
};
pub use status::{MemoryStatus, memory_status};
