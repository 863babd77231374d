//! The consumer-facing sink for parser output.

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::Object;
use crate::token::{Pos, TokenKind};

/// Severity of a diagnostic message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Failure raised by a [`Sender`] implementation.
///
/// Opaque wrapper around the transport's own error so the parser can
/// abort on any consumer-side failure without knowing the concrete
/// transport.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SendError(Box<dyn StdError + Send + Sync>);

impl SendError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Consumer of the parser's output stream.
///
/// For a single parse invocation the parser calls these in a fixed total
/// order: `send_metadata` exactly once (if the header was readable), then
/// tokens interleaved with diagnostics in source-position order, then the
/// final object batch in declaration order. Returning `Err` from any
/// method aborts the parse immediately; the failure surfaces to the
/// caller of the parse.
pub trait Sender {
    /// The file's declared CGE version, before any declaration.
    fn send_metadata(&mut self, cge_version: &str) -> Result<(), SendError>;

    /// A diagnostic. `end` is on the same line as `start`, one past the
    /// last character of the offending lexeme.
    fn send_diagnostic(
        &mut self,
        severity: Severity,
        message: &str,
        start: Pos,
        end: Pos,
    ) -> Result<(), SendError>;

    /// A scanned token; only called when token streaming is enabled, and
    /// never for error tokens.
    fn send_token(&mut self, kind: TokenKind, lexeme: &str, pos: Pos) -> Result<(), SendError>;

    /// A parsed object; only called after the whole file parsed without
    /// errors.
    fn send_object(&mut self, object: &Object) -> Result<(), SendError>;
}
