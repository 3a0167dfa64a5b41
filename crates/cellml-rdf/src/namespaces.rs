//! Namespace prefixes available to every XPath query

pub const RDF_PREFIX: &str = "rdf";
pub const CELLML_1_0_PREFIX: &str = "cellml10";
pub const CELLML_1_1_PREFIX: &str = "cellml11";

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const CELLML_1_0_NS: &str = "http://www.cellml.org/cellml/1.0#";
pub const CELLML_1_1_NS: &str = "http://www.cellml.org/cellml/1.1#";

/// Prefix to namespace URI bindings injected into XPath evaluation
pub const BINDINGS: &[(&str, &str)] = &[
    (RDF_PREFIX, RDF_NS),
    (CELLML_1_0_PREFIX, CELLML_1_0_NS),
    (CELLML_1_1_PREFIX, CELLML_1_1_NS),
];

/// Namespace URI bound to `prefix`, if any
pub fn lookup(prefix: &str) -> Option<&'static str> {
    BINDINGS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}
