//! XPath parser
//!
//! Recursive descent over the location-path subset of XPath 1.0:
//!
//! ```text
//! Expr         := Path ('|' Path)*
//! Path         := '/' Relative? | '//' Relative | Relative
//! Relative     := Step (('/' | '//') Step)*
//! Step         := '.' | '..' | ('@' | AxisName '::')? NodeTest
//! NodeTest     := '*' | NCName ':' '*' | QName | NodeType '(' ')'
//! ```

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xpath::lexer::{Lexer, Token, TokenKind};

/// Union of location paths
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub paths: Vec<LocationPath>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
}

impl Step {
    pub const fn new(axis: Axis, test: NodeTest) -> Self {
        Self { axis, test }
    }
}

/// Supported axes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    Attribute,
    FollowingSibling,
    PrecedingSibling,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "self" => Some(Self::SelfAxis),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "ancestor-or-self" => Some(Self::AncestorOrSelf),
            "attribute" => Some(Self::Attribute),
            "following-sibling" => Some(Self::FollowingSibling),
            "preceding-sibling" => Some(Self::PrecedingSibling),
            _ => None,
        }
    }
}

/// Node tests; names are still lexical here and resolved at evaluation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    AnyName,
    /// `prefix:*`
    NamespaceAny { prefix: String },
    /// `local` or `prefix:local`
    Name {
        prefix: Option<String>,
        local: String,
    },
    Node,
    Text,
    Comment,
    ProcessingInstruction,
}

/// Compile an XPath expression
pub fn compile(expression: &str) -> Result<Expr> {
    let tokens = Lexer::new(expression).tokenize()?;
    Parser { tokens, pos: 0 }.parse_expr()
}

static EOF: TokenKind = TokenKind::Eof;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_expr(mut self) -> Result<Expr> {
        let mut paths = vec![self.parse_path()?];
        while self.peek() == &TokenKind::Pipe {
            self.advance();
            paths.push(self.parse_path()?);
        }

        match self.peek() {
            TokenKind::Eof => Ok(Expr { paths }),
            TokenKind::LeftBracket => Err(self.unsupported("predicates")),
            TokenKind::Operator(op) => {
                let feature = format!("operator '{op}'");
                Err(self.unsupported(&feature))
            }
            _ => Err(self.syntax("unexpected token after location path")),
        }
    }

    fn parse_path(&mut self) -> Result<LocationPath> {
        match self.peek() {
            TokenKind::Slash => {
                self.advance();
                let steps = if self.at_step_start() {
                    self.parse_relative()?
                } else {
                    Vec::new()
                };
                Ok(LocationPath {
                    absolute: true,
                    steps,
                })
            }
            TokenKind::DoubleSlash => {
                self.advance();
                let mut steps = vec![Step::new(Axis::DescendantOrSelf, NodeTest::Node)];
                steps.extend(self.parse_relative()?);
                Ok(LocationPath {
                    absolute: true,
                    steps,
                })
            }
            _ => Ok(LocationPath {
                absolute: false,
                steps: self.parse_relative()?,
            }),
        }
    }

    fn parse_relative(&mut self) -> Result<Vec<Step>> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                TokenKind::Slash => {
                    self.advance();
                    steps.push(self.parse_step()?);
                }
                TokenKind::DoubleSlash => {
                    self.advance();
                    steps.push(Step::new(Axis::DescendantOrSelf, NodeTest::Node));
                    steps.push(self.parse_step()?);
                }
                _ => return Ok(steps),
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step> {
        match self.peek().clone() {
            TokenKind::Dot => {
                self.advance();
                Ok(Step::new(Axis::SelfAxis, NodeTest::Node))
            }
            TokenKind::DoubleDot => {
                self.advance();
                Ok(Step::new(Axis::Parent, NodeTest::Node))
            }
            TokenKind::At => {
                self.advance();
                Ok(Step::new(Axis::Attribute, self.parse_node_test()?))
            }
            TokenKind::Name {
                prefix: None,
                local,
            } if self.peek_at(1) == &TokenKind::DoubleColon => {
                let axis = match Axis::from_name(&local) {
                    Some(axis) => axis,
                    None if matches!(local.as_str(), "following" | "preceding" | "namespace") => {
                        return Err(self.unsupported(&format!("{local} axis")))
                    }
                    None => return Err(self.syntax(&format!("unknown axis '{local}'"))),
                };
                self.advance();
                self.advance();
                Ok(Step::new(axis, self.parse_node_test()?))
            }
            _ => Ok(Step::new(Axis::Child, self.parse_node_test()?)),
        }
    }

    fn parse_node_test(&mut self) -> Result<NodeTest> {
        match self.peek().clone() {
            TokenKind::Star => {
                self.advance();
                Ok(NodeTest::AnyName)
            }
            TokenKind::Name { prefix, local } if self.peek_at(1) == &TokenKind::LeftParen => {
                let test = match (prefix.as_deref(), local.as_str()) {
                    (None, "node") => NodeTest::Node,
                    (None, "text") => NodeTest::Text,
                    (None, "comment") => NodeTest::Comment,
                    (None, "processing-instruction") => NodeTest::ProcessingInstruction,
                    _ => return Err(self.unsupported("function calls")),
                };
                self.advance();
                self.advance();
                if self.peek() != &TokenKind::RightParen {
                    return Err(self.unsupported("node type test arguments"));
                }
                self.advance();
                Ok(test)
            }
            TokenKind::Name {
                prefix: Some(prefix),
                local,
            } if local == "*" => {
                self.advance();
                Ok(NodeTest::NamespaceAny { prefix })
            }
            TokenKind::Name { prefix, local } => {
                self.advance();
                Ok(NodeTest::Name { prefix, local })
            }
            TokenKind::Literal(_) | TokenKind::Number(_) => Err(self.unsupported("literal expressions")),
            TokenKind::Operator(op) if op == "$" => Err(self.unsupported("variable references")),
            TokenKind::LeftParen => Err(self.unsupported("parenthesized expressions")),
            TokenKind::Eof => Err(self.syntax("unexpected end of expression")),
            _ => Err(self.syntax("expected a node test")),
        }
    }

    fn at_step_start(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Dot
                | TokenKind::DoubleDot
                | TokenKind::At
                | TokenKind::Star
                | TokenKind::Name { .. }
        )
    }

    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .or_else(|| self.tokens.last())
            .map_or(&EOF, |token| &token.kind)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map_or_else(Span::empty, |token| Span::at(token.start))
    }

    fn syntax(&self, message: &str) -> Error {
        Error::with_message(ErrorKind::XPathSyntax, self.span(), message)
    }

    fn unsupported(&self, feature: &str) -> Error {
        Error::new(
            ErrorKind::XPathUnsupported {
                feature: feature.to_string(),
            },
            self.span(),
        )
    }
}
