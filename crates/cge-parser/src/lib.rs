// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Parser core for the CGE schema language.
//!
//! A CGE file declares a `cge` version header followed by top-level
//! `config`, `command`, `event`, `type`, and `enum` declarations. This
//! crate turns that text into a validated object model, streamed to a
//! [`Sender`](cge_ast::Sender) together with diagnostics and (optionally)
//! the raw token stream.
//!
//! # Pipeline
//!
//! - [`Scanner`] — hand-written UTF-8 scanner with ring-buffered
//!   lookahead
//! - parser — recursive descent with panic-mode error recovery and
//!   per-kind symbol tables
//! - cycle detection — rejects `type` declarations that contain
//!   themselves by value
//!
//! # Example
//!
//! ```
//! use cge_ast::{Object, Pos, SendError, Sender, Severity, TokenKind};
//!
//! #[derive(Default)]
//! struct Collect {
//!     objects: Vec<Object>,
//! }
//!
//! impl Sender for Collect {
//!     fn send_metadata(&mut self, _: &str) -> Result<(), SendError> {
//!         Ok(())
//!     }
//!     fn send_diagnostic(
//!         &mut self,
//!         _: Severity,
//!         _: &str,
//!         _: Pos,
//!         _: Pos,
//!     ) -> Result<(), SendError> {
//!         Ok(())
//!     }
//!     fn send_token(&mut self, _: TokenKind, _: &str, _: Pos) -> Result<(), SendError> {
//!         Ok(())
//!     }
//!     fn send_object(&mut self, object: &Object) -> Result<(), SendError> {
//!         self.objects.push(object.clone());
//!         Ok(())
//!     }
//! }
//!
//! let source = "cge 0.5\nevent ping { latency: int }\n";
//! let mut out = Collect::default();
//! cge_parser::parse(source.as_bytes(), &mut out, cge_parser::Config::default()).unwrap();
//! // The event plus the synthesized empty config.
//! assert_eq!(out.objects.len(), 2);
//! ```

mod cycle;
mod parser;
mod scanner;
pub mod version;

pub use scanner::Scanner;

use std::io::Read;

use cge_ast::{SendError, Sender};
use thiserror::Error;

/// Options applied to a single parse invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// Attach preceding doc comments to objects and properties.
    pub include_comments: bool,
    /// Stop after the metadata header; also skips the version
    /// compatibility check.
    pub only_metadata: bool,
    /// Forward every non-error token to the sender.
    pub send_tokens: bool,
    /// Suppress the final object stream; diagnostics and tokens still
    /// flow.
    pub no_objects: bool,
    /// Never emit warning diagnostics.
    pub disable_warnings: bool,
}

/// Fatal parse failure.
///
/// Problems in the source are *diagnostics*, not errors: they are
/// delivered through the [`Sender`] and the parse keeps going. `Error`
/// is reserved for the two failures that make continuing impossible.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to send parser output: {0}")]
    Send(#[from] SendError),
}

/// Parse CGE source from `input`, streaming results to `out`.
///
/// The sender receives, in order: the metadata message (once the header
/// is read), tokens and diagnostics interleaved in source order, and —
/// if the file produced no errors and objects are not suppressed — the
/// parsed objects in declaration order, with inline types preceding the
/// declaration that contains them. A file with diagnostics is still
/// `Ok(())`; only I/O and sender failures are `Err`.
pub fn parse<R: Read, S: Sender + ?Sized>(
    input: R,
    out: &mut S,
    config: Config,
) -> Result<(), Error> {
    let scanner = Scanner::new(input)?;
    parser::Parser::new(scanner, out, config).run()
}
