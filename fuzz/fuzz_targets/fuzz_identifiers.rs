#![no_main]

use egyvat::core::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let tax = is_valid_tax_number(s);
        let national = is_valid_national_id(s);
        let _ = is_valid_passport_number(s);
        let _ = is_valid_gs1_code(s);
        let _ = is_valid_activity_code(s);
        let _ = map_to_gs1_code(s);

        assert_eq!(national, parse_national_id(s).is_some());
        if tax {
            assert_eq!(determine_customer_type(Some(s), None, None), CustomerType::B2B);
        }
    }
});
