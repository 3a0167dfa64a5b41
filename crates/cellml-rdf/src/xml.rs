//! XML document layer: parsing, the arena tree and serialization

pub mod model;
pub mod parser;
pub mod writer;

use std::path::Path;

use tracing::debug;

pub use model::{AttrId, Attribute, Document, Element, NodeId, NodeKind, NodeRef, QName};
pub use parser::{Config, Parser, XML_NS};
pub use writer::{WriteOptions, Writer};

use crate::error::{Error, ErrorKind, Result, Span};

/// Parse an in-memory document; `locator` names it in errors and becomes
/// [`Document::locator`]
pub fn parse_bytes(bytes: &[u8], locator: Option<&str>) -> Result<Document> {
    parse_bytes_with_config(bytes, locator, Config::default())
}

/// Parse an in-memory document with a custom parser configuration
pub fn parse_bytes_with_config(
    bytes: &[u8],
    locator: Option<&str>,
    config: Config,
) -> Result<Document> {
    let parser = Parser::with_config(bytes, config);
    match locator {
        Some(locator) => parser.with_locator(locator).parse(),
        None => parser.parse(),
    }
}

/// Parse XML from string
pub fn parse_str(s: &str) -> Result<Document> {
    parse_bytes(s.as_bytes(), None)
}

/// Read and parse the file at `path`; the path becomes the document locator
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let locator = path_locator(path)?;
    let bytes = std::fs::read(path).map_err(|err| Error::io(locator, &err))?;
    debug!(path = locator, bytes = bytes.len(), "read document");
    parse_bytes(&bytes, Some(locator))
}

/// The path as text, exactly as given. A path that is not valid UTF-8 is
/// rejected rather than lossily converted, since the locator ends up in
/// `rdf:about` values.
pub fn path_locator(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        Error::with_message(
            ErrorKind::Io {
                path: path.to_string_lossy().into_owned(),
            },
            Span::empty(),
            format!("{}: path is not valid UTF-8", path.display()),
        )
    })
}

impl Document {
    /// Serialize with the default formatting options
    pub fn to_xml_string(&self) -> String {
        Writer::new(self, WriteOptions::default()).write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Category;

    #[test]
    fn test_parse_bytes_sets_locator() -> Result<()> {
        let doc = parse_bytes(b"<a/>", Some("models/a.cellml"))?;
        assert_eq!(doc.locator(), Some("models/a.cellml"));

        let err = parse_bytes(b"<a>", Some("models/a.cellml")).err();
        assert_eq!(err.as_ref().and_then(Error::source_name), Some("models/a.cellml"));
        Ok(())
    }

    #[test]
    fn test_parse_file_locator_is_path_as_given() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::io("tempdir", &e))?;
        let path = dir.path().join("m.cellml");
        std::fs::write(&path, "<model/>").map_err(|e| Error::io("m.cellml", &e))?;
        let doc = parse_file(&path)?;
        assert_eq!(doc.locator(), path.to_str());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"model\xff.cellml"));
        let err = path_locator(path).err();
        assert_eq!(err.map(|e| e.category()), Some(Category::Io));
        let err = parse_file(path).err();
        assert!(err.is_some_and(|e| e.message().contains("not valid UTF-8")));
    }
}
