#![no_main]

use libfuzzer_sys::fuzz_target;
use sv_formatter::{format_source, FormatStyle};

// Arbitrary bytes are almost never a valid module, so this mostly exercises
// `InvalidInput` handling; the rare well-formed slice reaches the full
// pipeline including the verifier, which is where a token-dropping bug
// would surface as `DataLoss` rather than a panic.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let _ = format_source(source, &FormatStyle::default());
});
