//! Fuzz target for restoring models from bundles.
//!
//! Bundles may come from anywhere, so restoring must fail with an error
//! rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lymph_core::Bilateral;

fuzz_target!(|data: &[u8]| {
    let _ = Bilateral::from_bundle_bytes(data.to_vec());
});
