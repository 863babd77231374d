// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Token and object model for the CGE schema language.
//!
//! CGE (Code Game Events) is a small schema language describing the
//! events, commands, types, enums, and configuration of a networked game
//! protocol. This crate holds the types shared between the parser and its
//! consumers:
//!
//! - [`Token`] / [`TokenKind`] / [`Pos`] — positioned lexemes
//! - [`Object`] / [`Property`] / [`PropertyType`] — parsed declarations
//! - [`Sender`] — the streaming interface the parser delivers results
//!   through
//!
//! The parser itself lives in `cge-parser`; a framed binary transport for
//! [`Sender`] lives in `cge-wire`.

pub mod object;
pub mod sender;
pub mod token;

pub use object::{DataKind, Object, ObjectKind, Property, PropertyType};
pub use sender::{SendError, Sender, Severity};
pub use token::{Pos, Token, TokenKind};
