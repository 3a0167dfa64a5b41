//! Extraction of embedded RDF metadata into a standalone RDF/XML document

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::cleaner::RDF_BLOCK_XPATH;
use crate::error::Result;
use crate::namespaces::{RDF_NS, RDF_PREFIX};
use crate::xml::{self, Document, NodeId, NodeRef, QName};
use crate::xpath::{execute_xpath, NodeSet};

/// Collect the children of every `rdf:RDF` block of `doc` beneath a single
/// new `rdf:RDF` root and serialize it.
///
/// Returns `Ok(None)` when the document carries no metadata.
#[instrument(skip_all, fields(locator = doc.locator()))]
pub fn extract_metadata(doc: &Document) -> Result<Option<String>> {
    let blocks = execute_xpath(doc, RDF_BLOCK_XPATH)?;
    let outer: Vec<NodeId> = blocks
        .nodes()
        .filter(|&block| !is_nested(doc, &blocks, block))
        .collect();
    let Some(&first) = outer.first() else {
        debug!("no rdf:RDF blocks");
        return Ok(None);
    };

    let mut out = Document::new(doc.locator().map(str::to_string));
    let root = rdf_root(&mut out)?;

    let mut scope = IndexMap::new();
    scope.insert(RDF_PREFIX.to_string(), RDF_NS.to_string());
    for (prefix, uri) in doc.in_scope_namespaces(first) {
        if prefix == RDF_PREFIX || prefix == "xml" {
            continue;
        }
        out.declare_namespace(root, &prefix, &uri)?;
        scope.insert(prefix, uri);
    }

    let mut copied = 0usize;
    for &block in &outer {
        let block_scope = doc.in_scope_namespaces(block);
        for &child in doc.children(block) {
            let copy = out.import_subtree(doc, child)?;
            let own: Vec<String> = out
                .element(copy)
                .map(|element| element.namespaces.keys().cloned().collect())
                .unwrap_or_default();
            if out.element(copy).is_some() {
                for (prefix, uri) in &block_scope {
                    let differs = scope.get(prefix).is_none_or(|bound| bound != uri);
                    if differs && prefix != "xml" && !own.contains(prefix) {
                        out.declare_namespace(copy, prefix, uri)?;
                    }
                }
                // a default namespace from the first block must not leak
                // into unprefixed names of a block that has none
                let leaks_default = scope.get("").is_some_and(|uri| !uri.is_empty())
                    && !block_scope.contains_key("")
                    && !own.iter().any(String::is_empty);
                if leaks_default {
                    out.declare_namespace(copy, "", "")?;
                }
            }
            out.append_child(root, copy)?;
            copied += 1;
        }
    }

    debug!(blocks = outer.len(), copied, "extracted rdf metadata");
    Ok(Some(out.to_xml_string()))
}

/// Parse the file at `path` and extract its metadata
pub fn extract_metadata_from_path(path: impl AsRef<Path>) -> Result<Option<String>> {
    let doc = xml::parse_file(path)?;
    extract_metadata(&doc)
}

/// Serialized `rdf:RDF` document with no content
pub fn empty_rdf_document() -> Result<String> {
    let mut doc = Document::default();
    rdf_root(&mut doc)?;
    Ok(doc.to_xml_string())
}

fn rdf_root(doc: &mut Document) -> Result<NodeId> {
    let root = doc.create_element(QName::new(Some(RDF_PREFIX), "RDF", Some(RDF_NS)));
    doc.declare_namespace(root, RDF_PREFIX, RDF_NS)?;
    doc.append_child(doc.root(), root)?;
    Ok(root)
}

fn is_nested(doc: &Document, blocks: &NodeSet, block: NodeId) -> bool {
    let mut current = doc.parent(block);
    while let Some(node) = current {
        if blocks.contains(NodeRef::Node(node)) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}
