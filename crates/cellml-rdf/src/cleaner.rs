//! Removal of embedded RDF metadata from a model document

use std::path::Path;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::xml::{self, Document};
use crate::xpath::execute_xpath;

/// Every RDF metadata block in the document
pub const RDF_BLOCK_XPATH: &str = "//rdf:RDF";

/// Parse the document at `path`, strip every `rdf:RDF` subtree and return the
/// reformatted remainder
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn clean_model(path: impl AsRef<Path>) -> Result<String> {
    let mut doc = xml::parse_file(path)?;
    clean_document(&mut doc)?;
    Ok(doc.to_xml_string())
}

/// Detach every `rdf:RDF` subtree from `doc`; returns how many were matched
pub fn clean_document(doc: &mut Document) -> Result<usize> {
    let blocks = execute_xpath(doc, RDF_BLOCK_XPATH)?;
    for block in blocks.nodes() {
        // a block nested in an earlier one is already detached with it and
        // is simply removed from its detached parent
        doc.remove_subtree(block)?;
    }
    debug!(removed = blocks.len(), "removed rdf:RDF blocks");
    Ok(blocks.len())
}
