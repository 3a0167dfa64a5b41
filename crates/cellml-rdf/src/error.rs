//! Error types for cellml-rdf

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    /// Spans produced outside of any source text have line 0
    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidToken,
    UnterminatedMarkup,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    MissingRoot,
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
    XPathContext,
    XPathSyntax,
    XPathUnboundPrefix { prefix: String },
    XPathUnsupported { feature: String },
    InvalidNode,
    Io { path: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnterminatedMarkup => write!(f, "unterminated markup"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity reference: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::MissingRoot => write!(f, "document has no root element"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::XPathContext => write!(f, "unable to create xpath context"),
            Self::XPathSyntax => write!(f, "invalid xpath expression"),
            Self::XPathUnboundPrefix { prefix } => {
                write!(f, "undefined namespace prefix in xpath: {prefix}")
            }
            Self::XPathUnsupported { feature } => write!(f, "unsupported xpath feature: {feature}"),
            Self::InvalidNode => write!(f, "invalid node"),
            Self::Io { path } => write!(f, "i/o error on {path}"),
        }
    }
}

/// Coarse grouping of error kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Parse,
    XPath,
    Document,
    Io,
}

impl ErrorKind {
    pub const fn category(&self) -> Category {
        match self {
            Self::InvalidToken
            | Self::UnterminatedMarkup
            | Self::MismatchedTag { .. }
            | Self::DuplicateAttribute { .. }
            | Self::InvalidEntity { .. }
            | Self::InvalidUtf8
            | Self::MissingRoot
            | Self::MaxDepthExceeded { .. }
            | Self::MaxSizeExceeded { .. } => Category::Parse,
            Self::XPathContext
            | Self::XPathSyntax
            | Self::XPathUnboundPrefix { .. }
            | Self::XPathUnsupported { .. } => Category::XPath,
            Self::InvalidNode => Category::Document,
            Self::Io { .. } => Category::Io,
        }
    }
}

/// Main error type for cellml-rdf
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
    source_name: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
            source_name: None,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            source_name: None,
        }
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    /// Wrap an I/O failure on `path`
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{path}: {err}");
        Self::with_message(ErrorKind::Io { path }, Span::empty(), message)
    }

    pub fn invalid_node(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::InvalidNode, Span::empty(), message)
    }

    /// Attach the name of the document the error was found in
    #[must_use]
    pub fn in_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source_name, self.span.is_empty()) {
            (Some(name), false) => write!(f, "{name}:{}: {}", self.span.start, self.message),
            (Some(name), true) => write!(f, "{name}: {}", self.message),
            (None, false) => write!(f, "error at {}: {}", self.span.start, self.message),
            (None, true) => write!(f, "{}", self.message),
        }
    }
}

/// Result type alias for cellml-rdf
pub type Result<T> = std::result::Result<T, Error>;
