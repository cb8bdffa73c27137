#![no_main]

use dustoff::utils::parse_icon_location;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(location) = parse_icon_location(s) {
            // Parsed base paths are never empty and carry no outer quotes
            let base = location.path.to_string_lossy();
            assert!(!base.is_empty());
            assert!(!base.starts_with('"') && !base.ends_with('"'));
        }
    }
});
