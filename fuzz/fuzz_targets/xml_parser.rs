#![no_main]
use cellml_rdf::xml::{parse_bytes, parse_str};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = parse_bytes(data, Some("fuzz.xml")) {
        let text = doc.to_xml_string();
        let reparsed = parse_str(&text).ok().map(|doc| doc.to_xml_string());
        assert_eq!(reparsed, Some(text));
    }
});
