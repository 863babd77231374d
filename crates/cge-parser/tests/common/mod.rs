//! Shared test support: an in-memory `Sender` that records everything the
//! parser emits.

#![allow(dead_code)]

use cge_ast::{Object, Pos, SendError, Sender, Severity, TokenKind};
use cge_parser::Config;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub start: Pos,
    pub end: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentToken {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Pos,
}

/// Records every message; optionally simulates a broken transport for a
/// single message kind.
#[derive(Debug, Default)]
pub struct RecordingSender {
    pub metadata: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub tokens: Vec<SentToken>,
    pub objects: Vec<Object>,

    pub fail_metadata: bool,
    pub fail_object: bool,
}

impl RecordingSender {
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect()
    }
}

impl Sender for RecordingSender {
    fn send_metadata(&mut self, cge_version: &str) -> Result<(), SendError> {
        if self.fail_metadata {
            return Err(SendError::new("metadata transport is down".to_owned()));
        }
        self.metadata.push(cge_version.to_owned());
        Ok(())
    }

    fn send_diagnostic(
        &mut self,
        severity: Severity,
        message: &str,
        start: Pos,
        end: Pos,
    ) -> Result<(), SendError> {
        self.diagnostics.push(Diagnostic {
            severity,
            message: message.to_owned(),
            start,
            end,
        });
        Ok(())
    }

    fn send_token(&mut self, kind: TokenKind, lexeme: &str, pos: Pos) -> Result<(), SendError> {
        self.tokens.push(SentToken {
            kind,
            lexeme: lexeme.to_owned(),
            pos,
        });
        Ok(())
    }

    fn send_object(&mut self, object: &Object) -> Result<(), SendError> {
        if self.fail_object {
            return Err(SendError::new("object transport is down".to_owned()));
        }
        self.objects.push(object.clone());
        Ok(())
    }
}

/// Parse `source` with `config`, expecting no fatal failure.
pub fn parse_with(source: &str, config: Config) -> RecordingSender {
    let mut sender = RecordingSender::default();
    cge_parser::parse(source.as_bytes(), &mut sender, config)
        .expect("parse should not fail fatally");
    sender
}

/// Parse `source` with the default configuration.
pub fn parse(source: &str) -> RecordingSender {
    parse_with(source, Config::default())
}
