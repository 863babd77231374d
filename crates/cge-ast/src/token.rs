//! Lexical tokens and source positions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source position of a token or diagnostic.
///
/// `line` is 1-based. `column` is a 0-based character offset within the
/// line; columns count code points, not bytes, so they line up with what
/// an editor shows.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Kind of a lexical token.
///
/// The discriminant order is part of the wire contract; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TokenKind {
    /// Deprecated `name` metadata keyword.
    GameName,
    /// The `cge` metadata keyword, or its deprecated `version` alias.
    CgeVersion,

    Config,
    Command,
    Event,
    Type,
    Enum,

    String,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,

    Map,
    List,

    Identifier,
    VersionNumber,

    BraceOpen,
    BraceClose,
    Colon,
    Comma,
    Greater,
    Less,

    Comment,

    /// Lexical error; the token's lexeme carries the diagnostic message.
    Error,
    Eof,
}

impl TokenKind {
    /// Keyword lookup for identifier-shaped lexemes.
    ///
    /// `int` and `float` are aliases for `int32` and `float64`; the
    /// scanned lexeme preserves the alias as written.
    pub fn keyword(name: &str) -> Option<TokenKind> {
        let kind = match name {
            "name" => TokenKind::GameName,
            "version" | "cge" => TokenKind::CgeVersion,
            "config" => TokenKind::Config,
            "command" => TokenKind::Command,
            "event" => TokenKind::Event,
            "type" => TokenKind::Type,
            "enum" => TokenKind::Enum,
            "string" => TokenKind::String,
            "bool" => TokenKind::Bool,
            "int" | "int32" => TokenKind::Int32,
            "int64" => TokenKind::Int64,
            "float32" => TokenKind::Float32,
            "float" | "float64" => TokenKind::Float64,
            "list" => TokenKind::List,
            "map" => TokenKind::Map,
            _ => return None,
        };
        Some(kind)
    }
}

/// A positioned lexeme.
///
/// `pos` is the start of the token's first character. Error tokens carry
/// their diagnostic message in `lexeme`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, pos: Pos) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            pos,
        }
    }

    /// Position one past the token's last character, on the same line.
    pub fn end(&self) -> Pos {
        Pos::new(self.pos.line, self.pos.column + self.lexeme.chars().count() as u32)
    }
}
