//! XPath lexer
//!
//! Tokenizes XPath expressions. Operators and literals outside the supported
//! location-path subset are still recognized so the parser can name them.

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::Cursor;

/// XPath token kinds
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Star,        // *
    DoubleColon, // ::
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    /// `prefix:local`, `prefix:*` or a bare NCName
    Name {
        prefix: Option<String>,
        local: String,
    },
    Literal(String),
    Number(String),
    /// Comparison, arithmetic and other operators: `=`, `!=`, `<`, `+`, `,`, `$`, ...
    Operator(String),
    Eof,
}

/// Token with its starting position
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: Pos,
}

/// XPath lexer
#[derive(Debug)]
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub const fn new(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input.as_bytes()),
        }
    }

    /// Tokenize the whole expression; the last token is always `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.cursor.skip_whitespace();
        let start = self.cursor.position();

        let Some(b) = self.cursor.current() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                start,
            });
        };

        let kind = match b {
            b'/' => {
                self.cursor.advance();
                if self.cursor.consume(b'/') {
                    TokenKind::DoubleSlash
                } else {
                    TokenKind::Slash
                }
            }
            b'.' if self.cursor.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            b'.' => {
                self.cursor.advance();
                if self.cursor.consume(b'.') {
                    TokenKind::DoubleDot
                } else {
                    TokenKind::Dot
                }
            }
            b'@' => self.single(TokenKind::At),
            b'|' => self.single(TokenKind::Pipe),
            b'*' => self.single(TokenKind::Star),
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b':' if self.cursor.peek(1) == Some(b':') => {
                self.cursor.advance_by(2);
                TokenKind::DoubleColon
            }
            b'"' | b'\'' => self.literal(b, start)?,
            b'0'..=b'9' => self.number(),
            b'!' if self.cursor.peek(1) == Some(b'=') => self.operator(2),
            b'<' | b'>' if self.cursor.peek(1) == Some(b'=') => self.operator(2),
            b'=' | b'<' | b'>' | b'+' | b'-' | b',' | b'$' => self.operator(1),
            b if is_name_start(b) => self.name(start)?,
            _ => {
                return Err(Error::with_message(
                    ErrorKind::XPathSyntax,
                    Span::at(start),
                    format!("unexpected character '{}'", char::from(b)),
                ))
            }
        };

        Ok(Token { kind, start })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }

    fn operator(&mut self, len: usize) -> TokenKind {
        let start = self.cursor.pos();
        self.cursor.advance_by(len);
        TokenKind::Operator(String::from_utf8_lossy(self.cursor.slice_from(start)).into_owned())
    }

    fn literal(&mut self, quote: u8, start: Pos) -> Result<TokenKind> {
        self.cursor.advance();
        let begin = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let text = String::from_utf8_lossy(self.cursor.slice_from(begin)).into_owned();
                self.cursor.advance();
                return Ok(TokenKind::Literal(text));
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::XPathSyntax,
            Span::new(start, self.cursor.position()),
            "unterminated string literal",
        ))
    }

    fn number(&mut self) -> TokenKind {
        let start = self.cursor.pos();
        while self
            .cursor
            .current()
            .is_some_and(|c| c.is_ascii_digit() || c == b'.')
        {
            self.cursor.advance();
        }
        TokenKind::Number(String::from_utf8_lossy(self.cursor.slice_from(start)).into_owned())
    }

    fn name(&mut self, start: Pos) -> Result<TokenKind> {
        let first = self.ncname();
        // a single colon joins a QName; `::` belongs to an axis
        if self.cursor.current() == Some(b':') && self.cursor.peek(1) != Some(b':') {
            self.cursor.advance();
            if self.cursor.consume(b'*') {
                return Ok(TokenKind::Name {
                    prefix: Some(first),
                    local: "*".to_string(),
                });
            }
            if !self.cursor.current().is_some_and(is_name_start) {
                return Err(Error::with_message(
                    ErrorKind::XPathSyntax,
                    Span::new(start, self.cursor.position()),
                    format!("incomplete qualified name '{first}:'"),
                ));
            }
            let local = self.ncname();
            return Ok(TokenKind::Name {
                prefix: Some(first),
                local,
            });
        }
        Ok(TokenKind::Name {
            prefix: None,
            local: first,
        })
    }

    fn ncname(&mut self) -> String {
        let start = self.cursor.pos();
        while self.cursor.current().is_some_and(is_name_char) {
            self.cursor.advance();
        }
        String::from_utf8_lossy(self.cursor.slice_from(start)).into_owned()
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Result<Vec<TokenKind>> {
        Ok(Lexer::new(input)
            .tokenize()?
            .into_iter()
            .map(|t| t.kind)
            .collect())
    }

    fn name(prefix: Option<&str>, local: &str) -> TokenKind {
        TokenKind::Name {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    #[test]
    fn test_attribute_path() -> Result<()> {
        assert_eq!(
            kinds("//@rdf:about")?,
            vec![
                TokenKind::DoubleSlash,
                TokenKind::At,
                name(Some("rdf"), "about"),
                TokenKind::Eof
            ]
        );
        Ok(())
    }

    #[test]
    fn test_axis_and_node_type() -> Result<()> {
        assert_eq!(
            kinds("descendant-or-self::node() | ../cellml10:*")?,
            vec![
                name(None, "descendant-or-self"),
                TokenKind::DoubleColon,
                name(None, "node"),
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Pipe,
                TokenKind::DoubleDot,
                TokenKind::Slash,
                name(Some("cellml10"), "*"),
                TokenKind::Eof
            ]
        );
        Ok(())
    }

    #[test]
    fn test_operators_and_literals() -> Result<()> {
        assert_eq!(
            kinds("[@a != 'x']")?,
            vec![
                TokenKind::LeftBracket,
                TokenKind::At,
                name(None, "a"),
                TokenKind::Operator("!=".to_string()),
                TokenKind::Literal("x".to_string()),
                TokenKind::RightBracket,
                TokenKind::Eof
            ]
        );
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("rdf:").tokenize().is_err());
        assert!(Lexer::new("#").tokenize().is_err());
    }
}
