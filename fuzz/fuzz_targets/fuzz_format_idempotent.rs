#![no_main]

use libfuzzer_sys::fuzz_target;
use sv_formatter::{format_source, FormatStyle};

// The fuzz-style stand-in for Open Question 3 (idempotence is tested, not
// proven): whatever this engine emits must be a fixed point of itself.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let style = FormatStyle::default();
    let Ok(first) = format_source(source, &style) else {
        return;
    };
    let Ok(second) = format_source(&first.formatted, &style) else {
        panic!("formatted output failed to re-format: {:?}", first.formatted);
    };
    assert_eq!(first.formatted, second.formatted, "formatting is not idempotent");
});
