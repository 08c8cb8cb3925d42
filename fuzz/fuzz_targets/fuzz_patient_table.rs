//! Fuzz target for patient tables: parsing, validation and splitting.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lymph_core::{BilateralTable, Side};

fuzz_target!(|data: &[u8]| {
    let Ok(table) = serde_json::from_slice::<BilateralTable>(data) else {
        return;
    };
    if table.validate().is_ok() {
        let _ = table.t_stages();
        for side in Side::BOTH {
            let _ = table.split(side);
        }
    }
});
