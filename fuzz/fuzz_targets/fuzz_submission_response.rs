#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(response) = egyvat::eta::parse_submission_response(data) {
        let _ = response.status();
    }
});
