//! Fuzz target: `BayLocation::from_str`
//!
//! Arbitrary text must either be rejected with a typed error or parse to
//! a location that formats back to exactly the same text.
//!
//! cargo fuzz run fuzz_location_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use vlm::location::BayLocation;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(loc) = text.parse::<BayLocation>() {
        assert!(loc.level >= 1, "level zero accepted");
        assert_eq!(loc.to_string(), text, "accepted non-canonical text");
    }
});
