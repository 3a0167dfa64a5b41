//! Property-based tests for reference correction and cleaning
//!
//! These tests use proptest to verify:
//! 1. `rdf:about` rewriting follows the empty / fragment / other rule
//! 2. Cleaning removes every rdf:RDF block and is idempotent
//! 3. Serialization is stable under reparsing

use cellml_rdf::{clean_document, correct_about, correct_rdf, execute_xpath, xml};
use proptest::prelude::*;

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

fn arb_base() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_/]{0,12}\\.cellml"
}

/// Strategy for rdf:about values of every shape the rewriter distinguishes
fn arb_about() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "#[a-zA-Z0-9_]{0,8}",
        "[a-z]{1,6}:[a-z0-9/#]{0,10}",
        "[a-z]{1,6}\\.cellml(#[a-z]{1,4})?",
    ]
}

/// A model with `blocks` rdf:RDF blocks interleaved with components
fn model_with_blocks(blocks: &[bool]) -> String {
    let mut out = format!(
        "<model xmlns=\"http://www.cellml.org/cellml/1.0#\" xmlns:rdf=\"{RDF_NS}\">"
    );
    for (i, nested) in blocks.iter().enumerate() {
        out.push_str(&format!("<component name=\"c{i}\">"));
        if *nested {
            out.push_str("<rdf:RDF><rdf:Description rdf:about=\"#x\"/></rdf:RDF>");
        }
        out.push_str("</component>");
        out.push_str("<rdf:RDF><rdf:Bag/></rdf:RDF>");
    }
    out.push_str("</model>");
    out
}

proptest! {
    #[test]
    fn about_rewrite_rule(value in arb_about(), base in arb_base()) {
        let corrected = correct_about(&value, &base);
        if value.is_empty() {
            prop_assert_eq!(&*corrected, base.as_str());
        } else if value.starts_with('#') {
            prop_assert_eq!(corrected.into_owned(), format!("{base}{value}"));
        } else {
            prop_assert_eq!(&*corrected, value.as_str());
        }
    }

    #[test]
    fn correct_rdf_applies_rule_to_every_about(
        values in prop::collection::vec(arb_about(), 0..6),
        base in arb_base(),
    ) {
        let mut rdf = format!("<rdf:RDF xmlns:rdf=\"{RDF_NS}\">");
        for value in &values {
            rdf.push_str(&format!("<rdf:Description rdf:about=\"{value}\"/>"));
        }
        rdf.push_str("</rdf:RDF>");

        let corrected = correct_rdf(&rdf, &base).unwrap();
        let doc = xml::parse_str(&corrected).unwrap();
        let abouts: Vec<String> = execute_xpath(&doc, "//@rdf:about")
            .unwrap()
            .iter()
            .map(|node| doc.string_value(node))
            .collect();
        let expected: Vec<String> = values
            .iter()
            .map(|value| correct_about(value, &base).into_owned())
            .collect();
        prop_assert_eq!(abouts, expected);
    }

    #[test]
    fn cleaning_removes_all_blocks(blocks in prop::collection::vec(any::<bool>(), 0..8)) {
        let mut doc = xml::parse_str(&model_with_blocks(&blocks)).unwrap();
        let removed = clean_document(&mut doc).unwrap();
        let nested = blocks.iter().filter(|nested| **nested).count();
        prop_assert_eq!(removed, blocks.len() + nested);
        prop_assert!(execute_xpath(&doc, "//rdf:RDF").unwrap().is_empty());
        prop_assert_eq!(
            execute_xpath(&doc, "//cellml10:component").unwrap().len(),
            blocks.len()
        );

        let cleaned = doc.to_xml_string();
        let mut reparsed = xml::parse_str(&cleaned).unwrap();
        prop_assert_eq!(clean_document(&mut reparsed).unwrap(), 0);
        prop_assert_eq!(reparsed.to_xml_string(), cleaned);
    }

    #[test]
    fn serialization_is_stable(blocks in prop::collection::vec(any::<bool>(), 0..8)) {
        let first = xml::parse_str(&model_with_blocks(&blocks)).unwrap().to_xml_string();
        let second = xml::parse_str(&first).unwrap().to_xml_string();
        prop_assert_eq!(first, second);
    }
}
