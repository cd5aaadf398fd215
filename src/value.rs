//! Typed values used for option keys, titles, descriptions and parsed values.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single primitive value.
///
/// Used both as a map key (option keys and titles) and as the stored value
/// of an option after parsing. Floats compare and hash by bit pattern so the
/// type satisfies `Eq`: `NaN` equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Char(char),
}

/// The active variant of a [`TypedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Char,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::Char => "char",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

impl TypedValue {
    /// Infer the value of a raw token.
    ///
    /// Tries integer, then `"true"`/`"false"`, then float. Each conversion
    /// must consume the whole token; anything else stays text.
    pub fn infer(token: &str) -> TypedValue {
        if let Ok(i) = token.parse::<i64>() {
            return TypedValue::Int(i);
        }
        match token {
            "true" => return TypedValue::Bool(true),
            "false" => return TypedValue::Bool(false),
            _ => {}
        }
        if let Ok(f) = token.parse::<f64>() {
            return TypedValue::Float(f);
        }
        TypedValue::Text(token.to_string())
    }

    /// Canonical text value for any string handle.
    pub fn text(s: impl AsRef<str>) -> TypedValue {
        TypedValue::Text(s.as_ref().to_string())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::Float(_) => ValueKind::Float,
            TypedValue::Char(_) => ValueKind::Char,
            TypedValue::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Int(a), TypedValue::Int(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a.to_bits() == b.to_bits(),
            (TypedValue::Char(a), TypedValue::Char(b)) => a == b,
            (TypedValue::Text(a), TypedValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypedValue {}

impl Hash for TypedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TypedValue::Bool(b) => b.hash(state),
            TypedValue::Int(i) => i.hash(state),
            TypedValue::Float(f) => f.to_bits().hash(state),
            TypedValue::Char(c) => c.hash(state),
            TypedValue::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::Float(x) => write!(f, "{:?}", x),
            TypedValue::Char(c) => write!(f, "{}", c),
            TypedValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Int(i)
    }
}

impl From<i32> for TypedValue {
    fn from(i: i32) -> Self {
        TypedValue::Int(i64::from(i))
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float(f)
    }
}

impl From<char> for TypedValue {
    fn from(c: char) -> Self {
        TypedValue::Char(c)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::text(s)
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::Text(s)
    }
}

impl From<&String> for TypedValue {
    fn from(s: &String) -> Self {
        TypedValue::text(s)
    }
}

impl From<Cow<'_, str>> for TypedValue {
    fn from(s: Cow<'_, str>) -> Self {
        TypedValue::Text(s.into_owned())
    }
}

impl From<Box<str>> for TypedValue {
    fn from(s: Box<str>) -> Self {
        TypedValue::Text(s.into_string())
    }
}

impl From<&TypedValue> for TypedValue {
    fn from(v: &TypedValue) -> Self {
        v.clone()
    }
}

/// Strict extraction of a payload from a [`TypedValue`].
///
/// Returns `None` when the active variant is not `Self::KIND`; no
/// conversion between variants is attempted.
pub trait FromTypedValue: Sized {
    const KIND: ValueKind;

    fn from_typed(value: &TypedValue) -> Option<Self>;
}

impl FromTypedValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromTypedValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromTypedValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FromTypedValue for char {
    const KIND: ValueKind = ValueKind::Char;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        match value {
            TypedValue::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl FromTypedValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_typed(value: &TypedValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}
