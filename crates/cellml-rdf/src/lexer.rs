//! Byte-level scanning shared by the XML parser and the XPath lexer

pub mod cursor;

pub use cursor::Cursor;
