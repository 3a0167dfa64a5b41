//! XML parser implementation

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::Cursor;
use crate::xml::model::{Document, NodeId, NodeKind, QName};

/// Namespace bound to the reserved `xml` prefix
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
    /// Keep whitespace-only text in element-only content
    pub keep_blank_text: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB default
            keep_blank_text: false,
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
            keep_blank_text: false,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
            keep_blank_text: false,
        }
    }

    pub const fn with_blank_text(mut self, keep: bool) -> Self {
        self.keep_blank_text = keep;
        self
    }
}

#[derive(Debug)]
struct Binding {
    prefix: String,
    uri: String,
    depth: u16,
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
    bindings: Vec<Binding>,
    doc: Document,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
            bindings: vec![Binding {
                prefix: "xml".to_string(),
                uri: XML_NS.to_string(),
                depth: 0,
            }],
            doc: Document::new(None),
        }
    }

    /// Set the locator of the produced document; errors name it too
    #[must_use]
    pub fn with_locator(mut self, locator: &str) -> Self {
        self.doc.set_locator(Some(locator.to_string()));
        self
    }

    /// Parse an XML document
    pub fn parse(mut self) -> Result<Document> {
        match self.parse_document() {
            Ok(()) => Ok(self.doc),
            Err(err) => match self.doc.locator() {
                Some(locator) => Err(err.in_source(locator)),
                None => Err(err),
            },
        }
    }

    fn parse_document(&mut self) -> Result<()> {
        let input = self.cursor.remaining();
        if self.config.max_size > 0 && input.len() > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }
        if let Err(err) = std::str::from_utf8(input) {
            let mut probe = self.cursor.clone();
            probe.advance_by(err.valid_up_to());
            return Err(Error::at(ErrorKind::InvalidUtf8, probe.position()));
        }

        self.parse_misc(true)?;
        if self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::MissingRoot, self.cursor.position()));
        }
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here(ErrorKind::InvalidToken, "text outside of the root element"));
        }

        let root = self.doc.root();
        self.parse_element(root)?;
        self.parse_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after the root element"));
        }
        Ok(())
    }

    /// Comments, processing instructions and whitespace around the root
    /// element; the prolog also admits the XML declaration and a DOCTYPE
    fn parse_misc(&mut self, prolog: bool) -> Result<()> {
        let root = self.doc.root();
        loop {
            self.cursor.skip_whitespace();
            if prolog && self.at_xml_declaration() {
                self.cursor.advance_by(5);
                self.skip_until(b"?>")?;
            } else if self.cursor.starts_with(b"<?") {
                self.parse_processing_instruction(root)?;
            } else if self.cursor.starts_with(b"<!--") {
                self.parse_comment(root)?;
            } else if prolog && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn at_xml_declaration(&self) -> bool {
        self.cursor.starts_with(b"<?xml")
            && matches!(
                self.cursor.peek(5),
                Some(b' ' | b'\t' | b'\r' | b'\n' | b'?')
            )
    }

    fn parse_element(&mut self, parent: NodeId) -> Result<()> {
        let start = self.cursor.position();
        self.expect_byte(b'<')?;
        let raw_name = self.parse_name()?;
        let raw_attributes = self.parse_attributes()?;

        self.depth = self.depth.saturating_add(1);
        if self.config.max_depth > 0 && self.depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                start,
            ));
        }

        let mut declarations = Vec::new();
        let mut attributes = Vec::new();
        for (name, value) in raw_attributes {
            if name == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                attributes.push((name, value));
            }
        }
        for (prefix, uri) in &declarations {
            self.bindings.push(Binding {
                prefix: prefix.clone(),
                uri: uri.clone(),
                depth: self.depth,
            });
        }

        let name = self.resolve(&raw_name, true, start);
        let id = self.doc.create_element(name);
        self.doc.append_child(parent, id)?;
        for (prefix, uri) in &declarations {
            self.doc.declare_namespace(id, prefix, uri)?;
        }
        for (raw, value) in &attributes {
            let name = self.resolve(raw, false, start);
            self.doc.add_attribute(id, name, value)?;
        }

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
        } else {
            self.expect_byte(b'>')?;
            self.parse_content(id, &raw_name)?;
            if !self.config.keep_blank_text {
                self.doc.prune_blank_text(id);
            }
        }

        self.pop_scope();
        Ok(())
    }

    fn parse_content(&mut self, id: NodeId, name: &str) -> Result<()> {
        loop {
            if self.cursor.starts_with(b"</") {
                let pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: name.to_string(),
                            found: close_name,
                        },
                        pos,
                    ));
                }
                self.cursor.skip_whitespace();
                return self.expect_byte(b'>');
            }

            if self.cursor.starts_with(b"<!--") {
                self.parse_comment(id)?;
            } else if self.cursor.starts_with(b"<![CDATA[") {
                self.parse_cdata(id)?;
            } else if self.cursor.starts_with(b"<?") {
                self.parse_processing_instruction(id)?;
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here(ErrorKind::InvalidToken, "unexpected markup declaration"));
            } else if self.cursor.current() == Some(b'<') {
                self.parse_element(id)?;
            } else if self.cursor.is_eof() {
                return Err(self.error_here(
                    ErrorKind::UnterminatedMarkup,
                    &format!("unterminated element <{name}>"),
                ));
            } else {
                let text = self.parse_text()?;
                let node = self.doc.create_leaf(NodeKind::Text(text))?;
                self.doc.append_child(id, node)?;
            }
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) => {}
                None => {
                    return Err(self.error_here(ErrorKind::UnterminatedMarkup, "unexpected end of input"))
                }
            }

            let pos = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")),
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw, pos)?
                    .replace("\r\n", " ")
                    .replace(|c: char| matches!(c, '\t' | '\n' | '\r'), " ");
                return decode_entities(&text, pos);
            }
            if b == b'<' {
                return Err(self.error_here(ErrorKind::InvalidToken, "'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = bytes_to_string(raw, pos)?.replace("\r\n", "\n");
        decode_entities(&text, pos)
    }

    fn parse_comment(&mut self, parent: NodeId) -> Result<()> {
        self.cursor.advance_by(4);
        let text = self.take_until(b"-->")?;
        let node = self.doc.create_leaf(NodeKind::Comment(text))?;
        self.doc.append_child(parent, node)
    }

    fn parse_cdata(&mut self, parent: NodeId) -> Result<()> {
        self.cursor.advance_by(9);
        let text = self.take_until(b"]]>")?;
        let node = self.doc.create_leaf(NodeKind::CData(text))?;
        self.doc.append_child(parent, node)
    }

    fn parse_processing_instruction(&mut self, parent: NodeId) -> Result<()> {
        self.cursor.advance_by(2);
        let target = self.parse_name()?;
        self.cursor.skip_whitespace();
        let data = self.take_until(b"?>")?;
        let node = self
            .doc
            .create_leaf(NodeKind::ProcessingInstruction { target, data })?;
        self.doc.append_child(parent, node)
    }

    fn parse_name(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.error_here(ErrorKind::UnterminatedMarkup, "expected name"));
        };
        if !is_name_start(first) {
            return Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::at(pos),
                "expected name",
            ));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start), pos)
    }

    fn resolve(&self, raw: &str, is_element: bool, pos: Pos) -> QName {
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, raw),
        };

        match prefix {
            Some(prefix) => match self.lookup(prefix) {
                Some(uri) if !uri.is_empty() => QName::new(Some(prefix), local, Some(uri)),
                _ => {
                    warn!(
                        prefix,
                        line = pos.line,
                        col = pos.col,
                        "namespace prefix is not defined"
                    );
                    QName::new(Some(prefix), local, None)
                }
            },
            None if is_element => match self.lookup("") {
                Some(uri) if !uri.is_empty() => QName::new(None, local, Some(uri)),
                _ => QName::local(local),
            },
            None => QName::local(local),
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.prefix == prefix)
            .map(|binding| binding.uri.as_str())
    }

    fn pop_scope(&mut self) {
        while self
            .bindings
            .last()
            .is_some_and(|binding| binding.depth >= self.depth && binding.depth > 0)
        {
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // cursor currently at "<!DOCTYPE"
        self.cursor.advance_by(9);
        let mut brackets = 0usize;
        while let Some(b) = self.cursor.current() {
            match b {
                b'"' | b'\'' => {
                    self.cursor.advance();
                    while self.cursor.current().is_some_and(|c| c != b) {
                        self.cursor.advance();
                    }
                }
                b'[' => brackets += 1,
                b']' => brackets = brackets.saturating_sub(1),
                b'>' if brackets == 0 => {
                    self.cursor.advance();
                    return Ok(());
                }
                _ => {}
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnterminatedMarkup, "unterminated DOCTYPE"))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.take_until(pattern).map(|_| ())
    }

    /// Consume input up to and including `pattern`, returning the text before it
    fn take_until(&mut self, pattern: &[u8]) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let text = bytes_to_string(self.cursor.slice_from(start), pos)?;
                self.cursor.advance_by(pattern.len());
                return Ok(text);
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::UnterminatedMarkup,
            Span::new(pos, self.cursor.position()),
            "unterminated markup",
        ))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error_here(ErrorKind::UnterminatedMarkup, "unexpected end of input"))
        } else {
            Err(self.error_here(
                ErrorKind::InvalidToken,
                &format!("expected '{}'", char::from(expected)),
            ))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        Error::with_message(kind, Span::at(self.cursor.position()), message)
    }
}

fn bytes_to_string(bytes: &[u8], pos: Pos) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);
        let after = after.get(1..).unwrap_or_default();
        let Some(end) = after.find(';') else {
            return Err(Error::at(
                ErrorKind::InvalidEntity {
                    entity: after.chars().take(8).collect(),
                },
                pos,
            ));
        };
        let (entity, tail) = after.split_at(end);

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::at(
                    ErrorKind::InvalidEntity {
                        entity: entity.to_string(),
                    },
                    pos,
                ))
            }
        }
        rest = tail.get(1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input.as_bytes()).parse()
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let doc = parse("<root></root>")?;
        let root = doc.root_element();
        assert!(root.is_some());
        let name = root.and_then(|id| doc.element(id)).map(|e| e.name.lexical());
        assert_eq!(name.as_deref(), Some("root"));
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes() -> Result<()> {
        let doc = parse("<root id=\"1\" name='test'></root>")?;
        let root = doc.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        let id = doc.find_attribute(root, None, "id");
        let name = doc.find_attribute(root, None, "name");
        assert_eq!(id.and_then(|a| doc.attribute_value(a)), Some("1"));
        assert_eq!(name.and_then(|a| doc.attribute_value(a)), Some("test"));
        Ok(())
    }

    #[test]
    fn test_parse_namespaces() -> Result<()> {
        let doc = parse(&format!(
            "<model xmlns=\"urn:cellml\" xmlns:rdf=\"{RDF}\"><rdf:RDF><rdf:Description rdf:about=\"#x\"/></rdf:RDF></model>"
        ))?;
        let model = doc.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        let element = doc.element(model).ok_or_else(|| Error::invalid_node("no model"))?;
        assert_eq!(element.name.namespace(), Some("urn:cellml"));

        let rdf = doc.children(model).first().copied().ok_or_else(|| Error::invalid_node("no rdf"))?;
        assert!(doc.element(rdf).is_some_and(|e| e.name.is(RDF, "RDF")));

        let description = doc.children(rdf).first().copied().ok_or_else(|| Error::invalid_node("no description"))?;
        let about = doc.find_attribute(description, Some(RDF), "about");
        assert_eq!(about.and_then(|a| doc.attribute_value(a)), Some("#x"));
        Ok(())
    }

    #[test]
    fn test_namespace_scope_ends_with_element() -> Result<()> {
        let doc = parse("<a><b xmlns:p=\"urn:p\"><p:c/></b><p:d/></a>")?;
        let names: Vec<Option<String>> = doc
            .descendants(doc.root())
            .filter_map(|id| doc.element(id))
            .map(|e| e.name.namespace().map(str::to_string))
            .collect();
        assert_eq!(names, vec![None, None, Some("urn:p".to_string()), None]);
        Ok(())
    }

    #[test]
    fn test_unprefixed_attribute_has_no_namespace() -> Result<()> {
        let doc = parse("<a xmlns=\"urn:d\" name=\"x\"/>")?;
        let root = doc.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        assert!(doc.find_attribute(root, None, "name").is_some());
        Ok(())
    }

    #[test]
    fn test_prolog_and_misc_nodes() -> Result<()> {
        let doc = parse(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE a [<!ENTITY x \"y\">]>\n<!-- head --><a><![CDATA[<raw>]]><?pi data?></a>\n",
        )?;
        let kinds: Vec<&NodeKind> = doc
            .children(doc.root())
            .iter()
            .filter_map(|&id| doc.kind(id))
            .collect();
        assert!(matches!(kinds.as_slice(), [NodeKind::Comment(_), NodeKind::Element(_)]));

        let root = doc.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        assert_eq!(doc.string_value(root.into()), "<raw>");
        Ok(())
    }

    #[test]
    fn test_blank_text_pruned_but_mixed_content_kept() -> Result<()> {
        let doc = parse("<a>\n  <b>x <i>y</i> z</b>\n</a>")?;
        let a = doc.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        assert_eq!(doc.children(a).len(), 1);
        assert_eq!(doc.string_value(a.into()), "x y z");

        let kept = Parser::with_config(b"<a>\n  <b/>\n</a>", Config::default().with_blank_text(true))
            .parse()?;
        let a = kept.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        assert_eq!(kept.children(a).len(), 3);
        Ok(())
    }

    #[test]
    fn test_entities() -> Result<()> {
        let doc = parse("<a t=\"&quot;&#65;&#x42;\">&lt;&amp;&gt;</a>")?;
        let a = doc.root_element().ok_or_else(|| Error::invalid_node("no root"))?;
        let t = doc.find_attribute(a, None, "t");
        assert_eq!(t.and_then(|id| doc.attribute_value(id)), Some("\"AB"));
        assert_eq!(doc.string_value(a.into()), "<&>");
        Ok(())
    }

    #[test]
    fn test_errors() {
        let kind = |input: &str| parse(input).err().map(|e| e.kind().clone());
        assert_eq!(
            kind("<a></b>"),
            Some(ErrorKind::MismatchedTag {
                expected: "a".to_string(),
                found: "b".to_string()
            })
        );
        assert_eq!(
            kind("<a x=\"1\" x=\"2\"/>"),
            Some(ErrorKind::DuplicateAttribute {
                name: "x".to_string()
            })
        );
        assert_eq!(
            kind("<a>&bogus;</a>"),
            Some(ErrorKind::InvalidEntity {
                entity: "bogus".to_string()
            })
        );
        assert_eq!(kind(""), Some(ErrorKind::MissingRoot));
        assert_eq!(kind("<!-- only -->"), Some(ErrorKind::MissingRoot));
        assert_eq!(kind("<a>"), Some(ErrorKind::UnterminatedMarkup));
        assert_eq!(kind("<a/><b/>"), Some(ErrorKind::InvalidToken));
    }

    #[test]
    fn test_limits() {
        let deep = "<a><a><a></a></a></a>";
        let err = Parser::with_config(deep.as_bytes(), Config::new(2, 0)).parse().err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::MaxDepthExceeded { max: 2 }));

        let err = Parser::with_config(deep.as_bytes(), Config::new(0, 4)).parse().err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::MaxSizeExceeded { max: 4 }));

        assert!(Parser::with_config(deep.as_bytes(), Config::unlimited()).parse().is_ok());
    }

    #[test]
    fn test_error_names_locator() {
        let err = Parser::new(b"<a>").with_locator("a.cellml").parse().err();
        assert_eq!(err.as_ref().and_then(Error::source_name), Some("a.cellml"));
    }
}
