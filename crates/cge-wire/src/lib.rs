// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Framed binary wire format for CGE parser output.
//!
//! Each [`Message`] is bincode-encoded and framed with a little-endian
//! `u32` length prefix, so a consumer can walk the stream incrementally
//! without a self-describing format. [`WireSender`] adapts any
//! [`io::Write`] into the parser's [`Sender`]; [`read_message`] is the
//! matching reader for consumers and tests.
//!
//! Objects are flattened for consumers: names become plain strings (empty
//! for `config`) and enum members get the synthetic
//! [`DataKind::EnumValue`] type the object model leaves implicit.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cge_ast::{
    DataKind, Object, ObjectKind, Pos, Property, PropertyType, SendError, Sender, Severity,
    TokenKind,
};

/// Upper bound on a single frame. Parser messages are tiny; anything
/// bigger indicates a corrupted stream.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Errors produced while encoding or decoding the framed stream.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o failure on message stream: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message payload: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame of {0} bytes exceeds the frame limit")]
    Oversize(usize),
}

/// One message on the wire, in the order the parser emits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Metadata {
        cge_version: String,
    },
    Diagnostic {
        severity: Severity,
        message: String,
        start: Pos,
        end: Pos,
    },
    Token {
        kind: TokenKind,
        lexeme: String,
        pos: Pos,
    },
    Object(ObjectMsg),
}

/// A parsed object, flattened for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMsg {
    pub kind: ObjectKind,
    /// Declared name; empty for `config`.
    pub name: String,
    pub properties: Vec<PropertyMsg>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMsg {
    pub name: String,
    pub ty: PropertyTypeMsg,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTypeMsg {
    pub name: String,
    pub kind: DataKind,
    pub generic: Option<Box<PropertyTypeMsg>>,
}

impl From<&Object> for ObjectMsg {
    fn from(object: &Object) -> Self {
        let is_enum = object.kind == ObjectKind::Enum;
        Self {
            kind: object.kind,
            name: object.name_str().to_owned(),
            properties: object
                .properties
                .iter()
                .map(|property| PropertyMsg::new(is_enum, property))
                .collect(),
            comment: object.comment.clone(),
        }
    }
}

impl PropertyMsg {
    fn new(is_enum: bool, property: &Property) -> Self {
        let ty = match (&property.ty, is_enum) {
            (Some(ty), false) => PropertyTypeMsg::from(ty),
            // Enum members have no declared type on the object model.
            _ => PropertyTypeMsg {
                name: String::new(),
                kind: DataKind::EnumValue,
                generic: None,
            },
        };
        Self {
            name: property.name.clone(),
            ty,
            comment: property.comment.clone(),
        }
    }
}

impl From<&PropertyType> for PropertyTypeMsg {
    fn from(ty: &PropertyType) -> Self {
        Self {
            name: ty.name.clone(),
            kind: ty.kind,
            generic: ty
                .generic
                .as_deref()
                .map(|generic| Box::new(PropertyTypeMsg::from(generic))),
        }
    }
}

/// A [`Sender`] writing the framed stream to any [`io::Write`].
pub struct WireSender<W> {
    out: W,
}

impl<W: Write> WireSender<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Encode one message with its length prefix.
    pub fn write_message(&mut self, message: &Message) -> Result<(), WireError> {
        let payload = bincode::serialize(message)?;
        if payload.len() > MAX_FRAME_LEN as usize {
            return Err(WireError::Oversize(payload.len()));
        }
        self.out.write_all(&(payload.len() as u32).to_le_bytes())?;
        self.out.write_all(&payload)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WireError> {
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Sender for WireSender<W> {
    fn send_metadata(&mut self, cge_version: &str) -> Result<(), SendError> {
        self.write_message(&Message::Metadata {
            cge_version: cge_version.to_owned(),
        })
        .map_err(SendError::new)
    }

    fn send_diagnostic(
        &mut self,
        severity: Severity,
        message: &str,
        start: Pos,
        end: Pos,
    ) -> Result<(), SendError> {
        self.write_message(&Message::Diagnostic {
            severity,
            message: message.to_owned(),
            start,
            end,
        })
        .map_err(SendError::new)
    }

    fn send_token(&mut self, kind: TokenKind, lexeme: &str, pos: Pos) -> Result<(), SendError> {
        self.write_message(&Message::Token {
            kind,
            lexeme: lexeme.to_owned(),
            pos,
        })
        .map_err(SendError::new)
    }

    fn send_object(&mut self, object: &Object) -> Result<(), SendError> {
        self.write_message(&Message::Object(ObjectMsg::from(object)))
            .map_err(SendError::new)
    }
}

/// Read one framed message; `Ok(None)` at a clean end of stream.
pub fn read_message<R: Read>(input: &mut R) -> Result<Option<Message>, WireError> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        match input.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(WireError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated frame header",
                )))
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(WireError::Io(err)),
        }
    }

    let len = u32::from_le_bytes(header);
    if len > MAX_FRAME_LEN {
        return Err(WireError::Oversize(len as usize));
    }
    let mut payload = vec![0u8; len as usize];
    input.read_exact(&mut payload)?;
    Ok(Some(bincode::deserialize(&payload)?))
}

/// Read all remaining messages from a stream.
pub fn read_all<R: Read>(input: &mut R) -> Result<Vec<Message>, WireError> {
    let mut messages = Vec::new();
    while let Some(message) = read_message(input)? {
        messages.push(message);
    }
    Ok(messages)
}
