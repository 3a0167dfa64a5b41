//! Formatting XML serializer

use crate::xml::model::{Document, NodeId, NodeKind};

/// Serializer options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level for element-only content
    pub indent: usize,
    /// Emit the `<?xml ...?>` declaration
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
        }
    }
}

impl WriteOptions {
    pub const fn new(indent: usize, declaration: bool) -> Self {
        Self {
            indent,
            declaration,
        }
    }
}

/// Writes a [`Document`] as UTF-8 text.
///
/// Element-only content is indented one node per line. An element with any
/// text or CDATA child is written inline so that its character data is
/// reproduced exactly; parsing the output and writing it again yields the
/// same text.
#[derive(Debug)]
pub struct Writer<'d> {
    doc: &'d Document,
    options: WriteOptions,
    out: String,
}

impl<'d> Writer<'d> {
    pub fn new(doc: &'d Document, options: WriteOptions) -> Self {
        Self {
            doc,
            options,
            out: String::new(),
        }
    }

    pub fn write(mut self) -> String {
        if self.options.declaration {
            self.out
                .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        }
        let doc = self.doc;
        for &child in doc.children(doc.root()) {
            self.write_node(child, 0, true);
            self.out.push('\n');
        }
        self.out
    }

    fn write_node(&mut self, id: NodeId, depth: usize, formatted: bool) {
        let doc = self.doc;
        let Some(kind) = doc.kind(id) else {
            return;
        };
        if formatted {
            self.push_indent(depth);
        }

        match kind {
            NodeKind::Root => {}
            NodeKind::Element(element) => {
                let name = element.name.lexical();
                self.out.push('<');
                self.out.push_str(&name);
                for (prefix, uri) in &element.namespaces {
                    if prefix.is_empty() {
                        self.out.push_str(" xmlns=\"");
                    } else {
                        self.out.push_str(" xmlns:");
                        self.out.push_str(prefix);
                        self.out.push_str("=\"");
                    }
                    escape_attribute(&mut self.out, uri);
                    self.out.push('"');
                }
                for &attr in &element.attributes {
                    if let Some(attr) = doc.attribute(attr) {
                        self.out.push(' ');
                        self.out.push_str(&attr.name.lexical());
                        self.out.push_str("=\"");
                        escape_attribute(&mut self.out, &attr.value);
                        self.out.push('"');
                    }
                }

                let children = doc.children(id);
                if children.is_empty() {
                    self.out.push_str("/>");
                    return;
                }
                self.out.push('>');

                let format_children = formatted
                    && !children.iter().any(|&child| {
                        matches!(
                            doc.kind(child),
                            Some(NodeKind::Text(_) | NodeKind::CData(_))
                        )
                    });
                for &child in children {
                    if format_children {
                        self.out.push('\n');
                    }
                    self.write_node(child, depth + 1, format_children);
                }
                if format_children {
                    self.out.push('\n');
                    self.push_indent(depth);
                }
                self.out.push_str("</");
                self.out.push_str(&name);
                self.out.push('>');
            }
            NodeKind::Text(text) => escape_text(&mut self.out, text),
            NodeKind::CData(text) => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(text);
                self.out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, data } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !data.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push_str("?>");
            }
        }
    }

    fn push_indent(&mut self, depth: usize) {
        let width = depth.saturating_mul(self.options.indent);
        self.out.extend(std::iter::repeat(' ').take(width));
    }
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}
