#![no_main]

use dustoff::monitor::{ProcessSnapshot, find_pids};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // First line is the display name, the rest are process names
    let mut lines = s.lines();
    let display_name = lines.next().unwrap_or_default();
    let snapshot = ProcessSnapshot::from_entries(
        lines.enumerate().map(|(i, name)| (name, u32::try_from(i).unwrap_or(u32::MAX))),
    );

    let all: BTreeSet<u32> = snapshot.iter().flat_map(|(_, pids)| pids.iter().copied()).collect();
    let found = find_pids(display_name, &snapshot);
    assert!(found.is_subset(&all));
});
