//! cellml-rdf - RDF metadata extraction for CellML documents
//!
//! CellML models may embed RDF/XML metadata in `rdf:RDF` blocks. This crate
//! pulls that metadata out into a standalone document, rewrites relative
//! `rdf:about` references against the model's location and strips the blocks
//! from the model.
//!
//! # Quick Start
//!
//! ```
//! use cellml_rdf::{correct_rdf, execute_xpath, xml};
//! # fn main() -> Result<(), cellml_rdf::Error> {
//! let rdf = r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//!   <rdf:Description rdf:about="#ref1"/>
//! </rdf:RDF>"##;
//! let corrected = correct_rdf(rdf, "model.cellml")?;
//! let doc = xml::parse_str(&corrected)?;
//! let about = execute_xpath(&doc, "//@rdf:about")?
//!     .first()
//!     .map(|node| doc.string_value(node))
//!     .unwrap_or_default();
//! assert_eq!(about, "model.cellml#ref1");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Category, Error, ErrorKind, Pos, Result, Span};

pub mod lexer;
pub mod namespaces;

pub mod xml;
pub use xml::{Document, NodeId, NodeRef};

pub mod xpath;
pub use xpath::{execute_xpath, NodeSet, XPathContext};

pub mod cleaner;
pub mod corrector;
pub mod extractor;
pub mod pipeline;
pub use cleaner::{clean_document, clean_model};
pub use corrector::{correct_about, correct_document, correct_rdf};
pub use extractor::{empty_rdf_document, extract_metadata, extract_metadata_from_path};
pub use pipeline::{extract, Extraction};
