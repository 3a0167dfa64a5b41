//! Rewriting of relative `rdf:about` references

use std::borrow::Cow;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::xml::{self, Document};
use crate::xpath::execute_xpath;

/// Every `rdf:about` attribute in the document
pub const ABOUT_XPATH: &str = "//@rdf:about";

/// Make an `rdf:about` value self-contained against `base`.
///
/// An empty value names the document itself and becomes `base`; a fragment
/// (`#id`) becomes `base#id`. Anything else is returned untouched. Bare
/// relative paths are not resolved.
pub fn correct_about<'a>(value: &'a str, base: &str) -> Cow<'a, str> {
    if value.is_empty() {
        Cow::Owned(base.to_string())
    } else if value.starts_with('#') {
        Cow::Owned(format!("{base}{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Parse `rdf_text`, correct every `rdf:about` against `base` and return the
/// reformatted document
#[instrument(skip(rdf_text), fields(bytes = rdf_text.len()))]
pub fn correct_rdf(rdf_text: &str, base: &str) -> Result<String> {
    let mut doc = xml::parse_str(rdf_text)?;
    correct_document(&mut doc, base)?;
    Ok(doc.to_xml_string())
}

/// Correct every `rdf:about` in `doc` in place; returns how many values changed
pub fn correct_document(doc: &mut Document, base: &str) -> Result<usize> {
    let abouts = execute_xpath(doc, ABOUT_XPATH)?;

    let mut changed = 0;
    for attr in abouts.attributes() {
        let value = doc.attribute_value(attr).unwrap_or_default().to_string();
        if let Cow::Owned(corrected) = correct_about(&value, base) {
            doc.set_attribute_value(attr, &corrected)?;
            changed += 1;
        }
    }

    debug!(matched = abouts.len(), changed, "corrected rdf:about references");
    Ok(changed)
}
