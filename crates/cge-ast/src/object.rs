//! Parsed declarations: objects, properties, and property types.

use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Kind of a top-level declaration.
///
/// The discriminant order is part of the wire contract; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectKind {
    Config,
    Command,
    Event,
    Type,
    Enum,
}

/// Data kind of a property type.
///
/// `EnumValue` never appears in parser output; the wire layer substitutes
/// it for the absent type of enum members. The discriminant order is part
/// of the wire contract; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataKind {
    String,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Map,
    List,
    EnumValue,
    /// Reference to a user-declared `type` or `enum`.
    Custom,
}

/// A property type tree node.
///
/// `name` is the type as written in source (so `int` stays `int` even
/// though its kind is `Int32`). `generic` is present iff `kind` is
/// [`DataKind::List`] or [`DataKind::Map`] and holds the element or value
/// type; map keys are implicitly strings in the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyType {
    pub name: String,
    pub kind: DataKind,
    pub generic: Option<Box<PropertyType>>,
}

impl PropertyType {
    /// A type without a generic parameter.
    pub fn scalar(name: impl Into<String>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
            generic: None,
        }
    }

    /// A `list<T>` or `map<T>` type.
    pub fn container(name: impl Into<String>, kind: DataKind, generic: PropertyType) -> Self {
        Self {
            name: name.into(),
            kind,
            generic: Some(Box::new(generic)),
        }
    }
}

/// A property of an object, or an enum member.
///
/// Enum members have no type; the wire layer emits them as
/// [`DataKind::EnumValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub ty: Option<PropertyType>,
    pub comment: Option<String>,
}

/// A top-level declaration.
///
/// `name` is `None` only for `config` (explicit or synthesized); it keeps
/// the full name token so later passes can anchor diagnostics to the
/// declaration site. Property order is source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    pub name: Option<Token>,
    pub properties: Vec<Property>,
    pub comment: Option<String>,
}

impl Object {
    /// The declared name, or the empty string for `config`.
    pub fn name_str(&self) -> &str {
        self.name.as_ref().map_or("", |token| token.lexeme.as_str())
    }
}
