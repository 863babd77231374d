//! Lexical scanner for CGE source text.
//!
//! Hand-written scanner that decodes a UTF-8 byte stream into code points
//! and produces [`Token`]s on demand. Already-scanned tokens sit in a
//! ring buffer so [`Scanner::peek_token`] supports arbitrary positive
//! lookahead without re-scanning.
//!
//! Malformed input never stops the scan: unexpected characters and
//! malformed version numbers become [`TokenKind::Error`] tokens whose
//! lexeme is the diagnostic message. Only I/O failures surface as `Err`.

use std::collections::VecDeque;
use std::io::{self, Read};

use cge_ast::{Pos, Token, TokenKind};

/// Initial lookahead capacity. The parser needs at most two tokens of
/// lookahead; the extra room amortizes growth when callers peek further.
const TOKEN_BUFFER_CAPACITY: usize = 32;

/// Decodes UTF-8 code points one at a time from a byte stream.
///
/// Carriage returns are dropped so `\r\n` and `\n` are equivalent.
/// Invalid sequences decode to U+FFFD instead of failing the scan; the
/// scanner then reports them as unexpected characters.
struct CharReader<R> {
    input: io::BufReader<R>,
}

impl<R: Read> CharReader<R> {
    fn new(input: R) -> Self {
        Self {
            input: io::BufReader::new(input),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Next code point, or `None` at end of input.
    fn read_char(&mut self) -> io::Result<Option<char>> {
        loop {
            let Some(first) = self.read_byte()? else {
                return Ok(None);
            };
            if first == b'\r' {
                continue;
            }
            if first < 0x80 {
                return Ok(Some(first as char));
            }
            let len = match first {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
            };
            let mut buf = [first, 0, 0, 0];
            for slot in buf.iter_mut().take(len).skip(1) {
                match self.read_byte()? {
                    Some(byte) if byte & 0xC0 == 0x80 => *slot = byte,
                    // Truncated or malformed sequence.
                    _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
                }
            }
            let decoded = std::str::from_utf8(&buf[..len])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Ok(Some(decoded));
        }
    }
}

/// On-demand tokenizer with arbitrary positive lookahead.
pub struct Scanner<R> {
    input: CharReader<R>,
    buffer: VecDeque<Token>,
    line: u32,
    column: u32,
    lexeme: String,
    next: Option<char>,
}

impl<R: Read> Scanner<R> {
    pub fn new(input: R) -> io::Result<Self> {
        let mut input = CharReader::new(input);
        let next = input.read_char()?;
        Ok(Self {
            input,
            buffer: VecDeque::with_capacity(TOKEN_BUFFER_CAPACITY),
            line: 1,
            column: 0,
            lexeme: String::new(),
            next,
        })
    }

    /// Consume and return the next token. Past end of input this keeps
    /// returning [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> io::Result<Token> {
        if self.buffer.is_empty() {
            self.scan_token()?;
        }
        Ok(self
            .buffer
            .pop_front()
            .expect("BUG: scan_token did not buffer a token"))
    }

    /// Return the token `offset` ahead without consuming it.
    /// `peek_token(0)` is the token [`Scanner::next_token`] would return.
    pub fn peek_token(&mut self, offset: usize) -> io::Result<&Token> {
        while self.buffer.len() <= offset {
            self.scan_token()?;
        }
        Ok(&self.buffer[offset])
    }

    /// Scan one token into the ring buffer.
    fn scan_token(&mut self) -> io::Result<()> {
        let mut next = self.next_char()?;
        loop {
            let Some(c) = next else {
                self.add_token(TokenKind::Eof);
                return Ok(());
            };

            if c.is_whitespace() {
                self.lexeme.clear();
                if c == '\n' {
                    self.line += 1;
                    self.column = 0;
                }
                next = self.next_char()?;
                continue;
            }

            match c {
                '{' => self.add_token(TokenKind::BraceOpen),
                '}' => self.add_token(TokenKind::BraceClose),
                ':' => self.add_token(TokenKind::Colon),
                ',' => self.add_token(TokenKind::Comma),
                '<' => self.add_token(TokenKind::Less),
                '>' => self.add_token(TokenKind::Greater),
                '/' => {
                    if self.match_char('/')? {
                        self.line_comment()?;
                    } else if self.match_char('*')? {
                        self.block_comment()?;
                    } else {
                        self.error_at_prev("unexpected character '/'".to_owned());
                    }
                }
                'a'..='z' | '_' => self.identifier()?,
                '0'..='9' => self.version_number()?,
                other => self.error_at_prev(format!("unexpected character '{other}'")),
            }
            return Ok(());
        }
    }

    fn identifier(&mut self) -> io::Result<()> {
        while matches!(self.peek_char(), Some('a'..='z' | '0'..='9' | '_')) {
            self.next_char()?;
        }
        let kind = TokenKind::keyword(&self.lexeme).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
        Ok(())
    }

    /// `digit+ '.' digit+` (MAJOR.MINOR).
    fn version_number(&mut self) -> io::Result<()> {
        while matches!(self.peek_char(), Some('0'..='9')) {
            self.next_char()?;
        }
        if !self.match_char('.')? {
            self.error_at_next("expected '.' after major version".to_owned());
            return Ok(());
        }
        if !matches!(self.peek_char(), Some('0'..='9')) {
            self.error_at_next("expected digit after '.'".to_owned());
            return Ok(());
        }
        while matches!(self.peek_char(), Some('0'..='9')) {
            self.next_char()?;
        }
        self.add_token(TokenKind::VersionNumber);
        Ok(())
    }

    /// `//` comment running to end of line; the lexeme excludes the `//`.
    fn line_comment(&mut self) -> io::Result<()> {
        let pos = Pos::new(self.line, self.column - 2);
        while !matches!(self.peek_char(), Some('\n') | None) {
            self.next_char()?;
        }
        let text = self.lexeme.strip_prefix("//").unwrap_or(&self.lexeme).to_owned();
        self.push_token(TokenKind::Comment, text, pos);
        Ok(())
    }

    /// `/* ... */` comment, possibly spanning lines. Positioned at the
    /// `/*`; an unterminated comment ends silently at end of input. The
    /// lexeme excludes the delimiters.
    fn block_comment(&mut self) -> io::Result<()> {
        let pos = Pos::new(self.line, self.column - 2);
        while self.peek_char().is_some() {
            let c = self.next_char()?;
            if c == Some('*') && self.match_char('/')? {
                break;
            }
            if c == Some('\n') {
                self.line += 1;
                self.column = 0;
            }
        }
        let text = self.lexeme.strip_prefix("/*").unwrap_or(&self.lexeme);
        let text = text.strip_suffix("*/").unwrap_or(text).to_owned();
        self.push_token(TokenKind::Comment, text, pos);
        Ok(())
    }

    /// Consume the pending character, if the input has one more.
    fn next_char(&mut self) -> io::Result<Option<char>> {
        let current = self.next;
        if let Some(c) = current {
            self.column += 1;
            self.lexeme.push(c);
        }
        self.next = self.input.read_char()?;
        Ok(current)
    }

    fn peek_char(&self) -> Option<char> {
        self.next
    }

    fn match_char(&mut self, expected: char) -> io::Result<bool> {
        if self.peek_char() != Some(expected) {
            return Ok(false);
        }
        self.next_char()?;
        Ok(true)
    }

    /// Emit the accumulated lexeme as a token starting where it began on
    /// the current line.
    fn add_token(&mut self, kind: TokenKind) {
        let len = self.lexeme.chars().count() as u32;
        let pos = Pos::new(self.line, self.column - len);
        let lexeme = std::mem::take(&mut self.lexeme);
        self.buffer.push_back(Token { kind, lexeme, pos });
    }

    /// Emit a token with an explicit lexeme and position, discarding the
    /// accumulated text (comments and error messages).
    fn push_token(&mut self, kind: TokenKind, lexeme: String, pos: Pos) {
        self.buffer.push_back(Token { kind, lexeme, pos });
        self.lexeme.clear();
    }

    /// Error token positioned at the not-yet-consumed character.
    fn error_at_next(&mut self, message: String) {
        let pos = Pos::new(self.line, self.column);
        self.push_token(TokenKind::Error, message, pos);
    }

    /// Error token positioned at the character just consumed.
    fn error_at_prev(&mut self, message: String) {
        let pos = Pos::new(self.line, self.column - 1);
        self.push_token(TokenKind::Error, message, pos);
    }
}
