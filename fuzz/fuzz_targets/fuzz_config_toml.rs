//! Fuzz target for TOML configuration parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lymph_config::LymphConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = LymphConfig::from_toml_str(text);
    }
});
