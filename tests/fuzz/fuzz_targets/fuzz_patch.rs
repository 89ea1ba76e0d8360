#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Diff splitting and patch parsing must not panic on any input.
    if let Ok(s) = std::str::from_utf8(data) {
        for (_, patch) in covgap::diff::split_diff(s) {
            let _ = covgap::patch::parse_patch(&patch);
        }
    }
});
