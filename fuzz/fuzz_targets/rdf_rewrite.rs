#![no_main]
use cellml_rdf::{clean_document, correct_rdf, extract_metadata, xml};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = correct_rdf(s, "fuzz.cellml");
        if let Ok(mut doc) = xml::parse_str(s) {
            if let Ok(Some(rdf)) = extract_metadata(&doc) {
                let _ = correct_rdf(&rdf, "fuzz.cellml");
            }
            let _ = clean_document(&mut doc);
        }
    }
});
