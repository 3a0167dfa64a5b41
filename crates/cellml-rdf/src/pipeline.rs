//! Extract, correct and clean a model file in one pass

use std::path::Path;

use tracing::{info, instrument};

use crate::cleaner::clean_model;
use crate::corrector::correct_rdf;
use crate::error::Result;
use crate::extractor::{empty_rdf_document, extract_metadata};
use crate::xml;

/// Outputs of processing one model file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// Corrected RDF/XML, `None` when the model carries no metadata
    pub rdf: Option<String>,
    /// The model with every `rdf:RDF` block removed
    pub cleaned_model: String,
}

impl Extraction {
    /// RDF/XML to write out; an empty `rdf:RDF` document when there is no metadata
    pub fn rdf_document(&self) -> Result<String> {
        match &self.rdf {
            Some(rdf) => Ok(rdf.clone()),
            None => empty_rdf_document(),
        }
    }
}

/// Extract the metadata of the model at `path`, resolve its `rdf:about`
/// references against the path and produce the cleaned model
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn extract(path: impl AsRef<Path>) -> Result<Extraction> {
    let path = path.as_ref();
    let base = xml::path_locator(path)?;

    let doc = xml::parse_file(path)?;
    let rdf = match extract_metadata(&doc)? {
        Some(raw) => Some(correct_rdf(&raw, base)?),
        None => None,
    };
    let cleaned_model = clean_model(path)?;

    info!(has_metadata = rdf.is_some(), "processed model");
    Ok(Extraction { rdf, cleaned_model })
}
