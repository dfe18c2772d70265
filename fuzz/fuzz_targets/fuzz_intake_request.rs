#![no_main]

use egyvat::intake::IntakeRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        if let Ok(request) = IntakeRequest::from_json(body) {
            let _ = request.check();
        }
    }
});
