use cellml_rdf::{clean_document, correct_rdf, execute_xpath, extract_metadata, xml, Category};

const RDF: &str = r##"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <rdf:Description rdf:about="#ref1">
    <dc:title>First</dc:title>
  </rdf:Description>
  <rdf:Description rdf:about="">
    <dc:title>Document</dc:title>
  </rdf:Description>
  <rdf:Description rdf:about="urn:example:kept"/>
</rdf:RDF>"##;

#[test]
fn test_fragment_and_empty_references() -> Result<(), Box<dyn std::error::Error>> {
    let corrected = correct_rdf(RDF, "model.cellml")?;
    let doc = xml::parse_str(&corrected)?;
    let abouts: Vec<String> = execute_xpath(&doc, "//@rdf:about")?
        .iter()
        .map(|node| doc.string_value(node))
        .collect();
    assert_eq!(
        abouts,
        vec!["model.cellml#ref1", "model.cellml", "urn:example:kept"]
    );
    Ok(())
}

#[test]
fn test_without_about_only_reformats() -> Result<(), Box<dyn std::error::Error>> {
    let input = "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n\
                 <rdf:Bag><rdf:li>one</rdf:li></rdf:Bag></rdf:RDF>";
    let corrected = correct_rdf(input, "ignored.cellml")?;
    let reformatted = xml::parse_str(input)?.to_xml_string();
    assert_eq!(corrected, reformatted);
    assert!(!corrected.contains("ignored.cellml"));
    Ok(())
}

#[test]
fn test_malformed_rdf() {
    let err = correct_rdf("<rdf:RDF><rdf:Description>", "m.cellml").err();
    assert_eq!(err.map(|e| e.category()), Some(Category::Parse));
}

#[test]
fn test_extract_then_clean_same_document() -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = xml::parse_str(
        r##"<model xmlns="http://www.cellml.org/cellml/1.0#" name="m">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about="#m"/>
  </rdf:RDF>
</model>"##,
    )?;
    let rdf = extract_metadata(&doc)?.unwrap_or_default();
    assert!(correct_rdf(&rdf, "m.cellml")?.contains("rdf:about=\"m.cellml#m\""));

    assert_eq!(clean_document(&mut doc)?, 1);
    assert_eq!(
        doc.to_xml_string(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <model xmlns=\"http://www.cellml.org/cellml/1.0#\" name=\"m\"/>\n"
    );
    Ok(())
}
