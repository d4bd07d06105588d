#![no_main]

use emitgen::analysis::extract_callsites;
use emitgen::profile::Profile;
use emitgen::tree::Package;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary dumps must either fail to parse or analyze without panicking
    if let Ok(package) = serde_json::from_slice::<Package>(data) {
        let _ = extract_callsites(&package, &Profile::default());
    }
});
