//! XPath location paths over [`Document`](crate::xml::Document) trees

pub mod eval;
pub mod lexer;
pub mod node_set;
pub mod parser;

use tracing::{debug, instrument};

pub use eval::XPathContext;
pub use node_set::NodeSet;
pub use parser::{compile, Axis, Expr, LocationPath, NodeTest, Step};

use crate::error::Result;
use crate::namespaces;
use crate::xml::Document;

/// Evaluate `expression` against `document` with the fixed RDF/CellML
/// namespace bindings.
///
/// No match is an empty set, not an error. Errors mean the expression could
/// not be evaluated at all and the caller has nothing to act on.
#[instrument(level = "debug", skip(document), fields(locator = document.locator()))]
pub fn execute_xpath(document: &Document, expression: &str) -> Result<NodeSet> {
    let context = XPathContext::with_bindings(document, namespaces::BINDINGS)?;
    let nodes = context.evaluate(expression)?;
    debug!(matches = nodes.len(), "evaluated xpath");
    Ok(nodes)
}
