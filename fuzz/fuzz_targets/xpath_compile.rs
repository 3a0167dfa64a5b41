#![no_main]
use cellml_rdf::{execute_xpath, xpath, Document};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(expression) = std::str::from_utf8(data) {
        if xpath::compile(expression).is_ok() {
            let _ = execute_xpath(&Document::default(), expression);
        }
    }
});
