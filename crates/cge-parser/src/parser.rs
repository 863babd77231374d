//! Recursive-descent parser for CGE source text.
//!
//! The parser pulls tokens from the [`Scanner`], accumulates object
//! declarations, and reports diagnostics through the configured
//! [`Sender`] as it goes. Syntax and semantic problems do not stop the
//! parse: the offending construct is reported and the parser skips ahead
//! to the next synchronizing token (panic mode), so one pass surfaces as
//! many independent problems as possible. Accumulated objects are
//! streamed to the sender only once the whole file has parsed without a
//! single error.

use std::collections::HashSet;
use std::io::Read;

use tracing::debug;

use cge_ast::{
    DataKind, Object, ObjectKind, Pos, Property, PropertyType, SendError, Sender, Severity, Token,
    TokenKind,
};

use crate::cycle;
use crate::scanner::Scanner;
use crate::version::{is_compatible, PARSER_VERSION};
use crate::{Config, Error};

/// A reported, recoverable parse error. The diagnostic has already been
/// delivered; `in_block` tells the recovery code whether the parser was
/// inside the declaration's block when the error occurred.
#[derive(Debug)]
struct ParseError {
    in_block: bool,
}

/// Why a parse function stopped early.
enum Interrupt {
    /// Recoverable; panic-mode recovery continues the parse.
    Recovered(ParseError),
    /// I/O or sender failure; the parse aborts.
    Fatal(Error),
}

impl From<std::io::Error> for Interrupt {
    fn from(err: std::io::Error) -> Self {
        Interrupt::Fatal(Error::Io(err))
    }
}

impl From<SendError> for Interrupt {
    fn from(err: SendError) -> Self {
        Interrupt::Fatal(Error::Send(err))
    }
}

type PResult<T> = Result<T, Interrupt>;

const DECLARATION_KEYWORDS: [TokenKind; 5] = [
    TokenKind::Config,
    TokenKind::Command,
    TokenKind::Event,
    TokenKind::Type,
    TokenKind::Enum,
];

const PROPERTY_TYPE_TOKENS: [TokenKind; 11] = [
    TokenKind::String,
    TokenKind::Bool,
    TokenKind::Int32,
    TokenKind::Int64,
    TokenKind::Float32,
    TokenKind::Float64,
    TokenKind::Map,
    TokenKind::List,
    TokenKind::Identifier,
    TokenKind::Type,
    TokenKind::Enum,
];

pub(crate) struct Parser<'a, R, S: ?Sized> {
    out: &'a mut S,
    config: Config,
    scanner: Scanner<R>,
    previous: Token,

    objects: Vec<Object>,
    commands: HashSet<String>,
    events: HashSet<String>,
    types: HashSet<String>,
    config_seen: bool,
    pending_type_refs: Vec<Token>,

    had_error: bool,
}

impl<'a, R: Read, S: Sender + ?Sized> Parser<'a, R, S> {
    pub fn new(scanner: Scanner<R>, out: &'a mut S, config: Config) -> Self {
        Self {
            out,
            config,
            scanner,
            previous: Token::new(TokenKind::Eof, "", Pos::new(1, 0)),
            objects: Vec::new(),
            commands: HashSet::new(),
            events: HashSet::new(),
            types: HashSet::new(),
            config_seen: false,
            pending_type_refs: Vec::new(),
            had_error: false,
        }
    }

    pub fn run(mut self) -> Result<(), Error> {
        match self.parse_file() {
            Ok(()) => Ok(()),
            // Already reported through the sender; an unusable header or
            // incompatible version ends the parse without declarations.
            Err(Interrupt::Recovered(_)) => Ok(()),
            Err(Interrupt::Fatal(err)) => Err(err),
        }
    }

    fn parse_file(&mut self) -> PResult<()> {
        self.metadata()?;
        if self.config.only_metadata {
            return Ok(());
        }

        while self.peek(0)?.kind != TokenKind::Eof {
            match self.declaration() {
                Ok(object) => self.objects.push(object),
                Err(Interrupt::Recovered(err)) => self.skip_block(err.in_block)?,
                Err(fatal) => return Err(fatal),
            }
        }

        let pending = std::mem::take(&mut self.pending_type_refs);
        for id in &pending {
            if !self.types.contains(&id.lexeme) {
                self.report(id, format!("undefined type '{}'.", id.lexeme))?;
            }
        }

        if !self.config_seen {
            self.objects.push(Object {
                kind: ObjectKind::Config,
                name: None,
                properties: Vec::new(),
                comment: None,
            });
        }

        for found in cycle::detect(&self.objects) {
            let message = found.message();
            self.report(&found.token, message)?;
        }

        if !self.config.no_objects && !self.had_error {
            for object in &self.objects {
                self.out.send_object(object)?;
            }
        }
        debug!(
            objects = self.objects.len(),
            had_error = self.had_error,
            "finished parsing"
        );
        Ok(())
    }

    /// Parse the required header: tolerated leading comments, an optional
    /// deprecated `name` field, and exactly one `cge <version>` entry.
    fn metadata(&mut self) -> PResult<()> {
        while self.match_token(&[TokenKind::Comment])? {
            let comment = self.previous.clone();
            self.warn(&comment, "game comments are deprecated")?;
        }

        if self.match_token(&[TokenKind::GameName])? {
            let keyword = self.previous.clone();
            self.warn(&keyword, "the 'name' metadata field is deprecated")?;
            if !self.match_token(&[TokenKind::Identifier])? {
                let found = self.peek(0)?;
                return Err(self.error(&found, "expected identifier after 'name' keyword", false));
            }
        }

        let mut version: Option<Token> = None;
        while self.match_token(&[TokenKind::CgeVersion])? {
            let keyword = self.previous.clone();
            if version.is_some() {
                return Err(self.error(&keyword, "duplicate 'cge' metadata field", false));
            }
            if !self.match_token(&[TokenKind::VersionNumber])? {
                let found = self.peek(0)?;
                return Err(self.error(
                    &found,
                    "expected version number after 'cge' keyword",
                    false,
                ));
            }
            if keyword.lexeme == "version" {
                self.warn(
                    &keyword,
                    "the 'version' metadata field is deprecated; use 'cge' instead",
                )?;
            }
            version = Some(self.previous.clone());
        }
        let Some(version) = version else {
            let found = self.peek(0)?;
            return Err(self.error(&found, "missing required 'cge' metadata field", false));
        };

        self.out.send_metadata(&version.lexeme)?;

        if !self.config.only_metadata && !is_compatible(&version.lexeme, PARSER_VERSION) {
            let message = format!(
                "incompatible CGE version (file: {}, parser: {})",
                version.lexeme, PARSER_VERSION
            );
            return Err(self.error(&version, message, false));
        }

        Ok(())
    }

    fn declaration(&mut self) -> PResult<Object> {
        let comment = self.comment()?;

        if !self.match_token(&DECLARATION_KEYWORDS)? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected type declaration", false));
        }
        let keyword = self.previous.clone();
        let kind = match keyword.kind {
            TokenKind::Config => ObjectKind::Config,
            TokenKind::Command => ObjectKind::Command,
            TokenKind::Event => ObjectKind::Event,
            TokenKind::Type => ObjectKind::Type,
            _ => ObjectKind::Enum,
        };

        let name = if kind == ObjectKind::Config {
            if self.config_seen {
                return Err(self.error(&keyword, "duplicate config object", false));
            }
            self.config_seen = true;
            None
        } else {
            if !self.match_token(&[TokenKind::Identifier])? {
                let found = self.peek(0)?;
                let message = format!("expected identifier after '{}' keyword.", keyword.lexeme);
                return Err(self.error(&found, message, false));
            }
            Some(self.previous.clone())
        };

        if let Some(name) = &name {
            let defined = match kind {
                ObjectKind::Command => !self.commands.insert(name.lexeme.clone()),
                ObjectKind::Event => !self.events.insert(name.lexeme.clone()),
                _ => !self.types.insert(name.lexeme.clone()),
            };
            if defined {
                let noun = match kind {
                    ObjectKind::Command => "command",
                    ObjectKind::Event => "event",
                    _ => "type",
                };
                let message = format!("{noun} '{}' already defined", name.lexeme);
                return Err(self.error(name, message, false));
            }
        }

        if !self.match_token(&[TokenKind::BraceOpen])? {
            let found = self.peek(0)?;
            let message = if kind == ObjectKind::Config {
                format!("expected block after '{}' keyword", keyword.lexeme)
            } else {
                format!("expected block after {} name", keyword.lexeme)
            };
            return Err(self.error(&found, message, true));
        }

        let properties = self.block(kind == ObjectKind::Enum)?;

        Ok(Object {
            kind,
            name,
            properties,
            comment,
        })
    }

    /// Parse a `{ ... }` body: comma-separated properties, or bare enum
    /// members when `enum_members` is set. The trailing comma before `}`
    /// is optional. Broken properties are skipped individually so the
    /// rest of the block still parses.
    fn block(&mut self, enum_members: bool) -> PResult<Vec<Property>> {
        let mut properties = Vec::new();

        loop {
            let next = self.peek(0)?.kind;
            if next == TokenKind::Eof || next == TokenKind::BraceClose {
                break;
            }
            let parsed = if enum_members {
                self.enum_value()
            } else {
                self.property()
            };
            match parsed {
                Ok(property) => {
                    properties.push(property);
                    if !self.match_token(&[TokenKind::Comma])? {
                        break;
                    }
                }
                Err(Interrupt::Recovered(_)) => self.skip_property()?,
                Err(fatal) => return Err(fatal),
            }
        }

        if !self.match_token(&[TokenKind::BraceClose])? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected '}' after block", true));
        }

        Ok(properties)
    }

    fn property(&mut self) -> PResult<Property> {
        let comment = self.comment()?;

        if !self.match_token(&[TokenKind::Identifier])? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected property name", true));
        }
        let name = self.previous.clone();

        if !self.match_token(&[TokenKind::Colon])? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected ':' after property name", true));
        }

        let ty = self.property_type()?;

        Ok(Property {
            name: name.lexeme,
            ty: Some(ty),
            comment,
        })
    }

    fn enum_value(&mut self) -> PResult<Property> {
        let comment = self.comment()?;

        if !self.match_token(&[TokenKind::Identifier])? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected property name", true));
        }

        Ok(Property {
            name: self.previous.lexeme.clone(),
            ty: None,
            comment,
        })
    }

    /// Parse a property type: a primitive keyword, `list<T>` / `map<T>`,
    /// a reference to a user type, or an inline `type`/`enum`
    /// declaration.
    fn property_type(&mut self) -> PResult<PropertyType> {
        if !self.match_token(&PROPERTY_TYPE_TOKENS)? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected type after property name", true));
        }
        let token = self.previous.clone();

        match token.kind {
            TokenKind::Identifier => {
                // Must resolve against the declared types at end of parse.
                self.pending_type_refs.push(token.clone());
                Ok(PropertyType::scalar(token.lexeme, DataKind::Custom))
            }
            TokenKind::Type | TokenKind::Enum => self.inline_declaration(&token),
            TokenKind::Map | TokenKind::List => {
                if !self.match_token(&[TokenKind::Less])? {
                    let found = self.peek(0)?;
                    return Err(self.error(&found, "expected generic", true));
                }
                let generic = self.property_type()?;
                if !self.match_token(&[TokenKind::Greater])? {
                    let found = self.peek(0)?;
                    return Err(self.error(&found, "expected '>' after generic value", true));
                }
                let kind = if token.kind == TokenKind::Map {
                    DataKind::Map
                } else {
                    DataKind::List
                };
                Ok(PropertyType::container(token.lexeme, kind, generic))
            }
            _ => {
                let kind = match token.kind {
                    TokenKind::String => DataKind::String,
                    TokenKind::Bool => DataKind::Bool,
                    TokenKind::Int32 => DataKind::Int32,
                    TokenKind::Int64 => DataKind::Int64,
                    TokenKind::Float32 => DataKind::Float32,
                    _ => DataKind::Float64,
                };
                Ok(PropertyType::scalar(token.lexeme, kind))
            }
        }
    }

    /// An inline `type name { ... }` / `enum name { ... }` in type
    /// position registers a new top-level declaration and resolves the
    /// enclosing property to a reference to it.
    fn inline_declaration(&mut self, keyword: &Token) -> PResult<PropertyType> {
        if !self.match_token(&[TokenKind::Identifier])? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected identifier after 'type' keyword", true));
        }
        let name = self.previous.clone();

        if !self.types.insert(name.lexeme.clone()) {
            let message = format!("type '{}' is already defined", name.lexeme);
            return Err(self.error(&name, message, true));
        }

        if !self.match_token(&[TokenKind::BraceOpen])? {
            let found = self.peek(0)?;
            return Err(self.error(&found, "expected block after type name", true));
        }

        let properties = self.block(keyword.kind == TokenKind::Enum)?;

        let kind = if keyword.kind == TokenKind::Type {
            ObjectKind::Type
        } else {
            ObjectKind::Enum
        };
        self.objects.push(Object {
            kind,
            name: Some(name.clone()),
            properties,
            comment: None,
        });

        Ok(PropertyType::scalar(name.lexeme, DataKind::Custom))
    }

    /// Consume a contiguous run of comment tokens. Their lexemes are
    /// joined with `\n` when comments are requested, and discarded
    /// otherwise.
    fn comment(&mut self) -> PResult<Option<String>> {
        let mut comments: Vec<String> = Vec::new();
        while self.match_token(&[TokenKind::Comment])? {
            if self.config.include_comments {
                comments.push(self.previous.lexeme.clone());
            }
        }
        if comments.is_empty() {
            Ok(None)
        } else {
            Ok(Some(comments.join("\n")))
        }
    }

    /// Panic-mode recovery for a broken declaration. When the error
    /// occurred before the declaration's block, first advance to the next
    /// `{`; then skip balanced braces until the block closes.
    fn skip_block(&mut self, in_block: bool) -> PResult<()> {
        if self.peek(0)?.kind == TokenKind::Eof {
            return Ok(());
        }

        if !in_block {
            loop {
                if self.match_token(&[TokenKind::Eof])? {
                    return Ok(());
                }
                if self.match_token(&[TokenKind::BraceOpen])? {
                    break;
                }
                self.advance()?;
            }
        }

        let mut nesting = 1u32;
        while self.peek(0)?.kind != TokenKind::Eof && nesting > 0 {
            match self.peek(0)?.kind {
                TokenKind::BraceOpen => nesting += 1,
                TokenKind::BraceClose => nesting -= 1,
                _ => {}
            }
            self.advance()?;
        }
        Ok(())
    }

    /// Advance to the next `,` at the current nesting depth, or stop at
    /// the `}` that closes the enclosing block.
    fn skip_property(&mut self) -> PResult<()> {
        if self.peek(0)?.kind == TokenKind::Eof {
            return Ok(());
        }

        let mut nesting: i32 = 0;
        while self.peek(0)?.kind != TokenKind::Eof {
            match self.peek(0)?.kind {
                TokenKind::BraceOpen => nesting += 1,
                TokenKind::BraceClose => {
                    nesting -= 1;
                    if nesting == -1 {
                        return Ok(());
                    }
                }
                _ => {}
            }
            if nesting == 0 && self.match_token(&[TokenKind::Comma])? {
                return Ok(());
            }
            self.advance()?;
        }
        Ok(())
    }

    /// Consume the next token, forwarding it to the sender when token
    /// streaming is on (error tokens are never forwarded).
    fn advance(&mut self) -> PResult<()> {
        let token = self.scanner.next_token()?;
        if self.config.send_tokens && token.kind != TokenKind::Error {
            self.out.send_token(token.kind, &token.lexeme, token.pos)?;
        }
        self.previous = token;
        Ok(())
    }

    /// Consume the next token iff its kind is one of `kinds`; the
    /// consumed token is left in `self.previous`.
    fn match_token(&mut self, kinds: &[TokenKind]) -> PResult<bool> {
        if kinds.contains(&self.peek(0)?.kind) {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn peek(&mut self, offset: usize) -> PResult<Token> {
        Ok(self.scanner.peek_token(offset)?.clone())
    }

    /// Report a warning diagnostic spanning `token`.
    fn warn(&mut self, token: &Token, message: &str) -> PResult<()> {
        if self.config.disable_warnings {
            return Ok(());
        }
        self.out
            .send_diagnostic(Severity::Warning, message, token.pos, token.end())?;
        Ok(())
    }

    /// Report an error diagnostic spanning `token` and produce the
    /// matching interrupt. For scanner error tokens the message comes
    /// from the token itself and the span is a single character.
    fn error(&mut self, token: &Token, message: impl Into<String>, in_block: bool) -> Interrupt {
        self.had_error = true;

        let mut message = message.into();
        let end = if token.kind == TokenKind::Error {
            message = token.lexeme.clone();
            Pos::new(token.pos.line, token.pos.column + 1)
        } else {
            token.end()
        };

        if let Err(err) = self
            .out
            .send_diagnostic(Severity::Error, &message, token.pos, end)
        {
            return Interrupt::Fatal(Error::Send(err));
        }
        Interrupt::Recovered(ParseError { in_block })
    }

    /// Report an error diagnostic where no recovery follows (post-parse
    /// validation); only sender failures propagate.
    fn report(&mut self, token: &Token, message: impl Into<String>) -> PResult<()> {
        match self.error(token, message, false) {
            Interrupt::Fatal(err) => Err(Interrupt::Fatal(err)),
            Interrupt::Recovered(_) => Ok(()),
        }
    }
}
