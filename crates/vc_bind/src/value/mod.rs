//! The in-memory side of a binding.
//!
//! Decoders produce a [`Value`] and encoders consume one. Scalars and
//! containers have natural variants; user types travel as an [`Object`]
//! tagged with their runtime descriptor.
//!
//! Conversions between Rust types and values go through:
//!
//! - [`Typed`]: the [`TypeDescriptor`] of a Rust type.
//! - [`ToValue`] / [`FromValue`]: to and from a [`Value`].
//! - [`MergeValue`]: merge a decoded container into an existing one.

// -----------------------------------------------------------------------------
// Modules

mod convert;
mod object;

// -----------------------------------------------------------------------------
// Exports

pub use convert::{Bytes, FromValue, MergeValue, ToValue, Typed};
pub use object::Object;

// -----------------------------------------------------------------------------
// Value

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{ScalarKind, TypeDescriptor};

/// An enum constant: its type, ordinal and bound name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    descriptor: TypeDescriptor,
    index: usize,
    name: String,
}

impl EnumValue {
    #[inline]
    pub fn new(descriptor: TypeDescriptor, index: usize, name: impl Into<String>) -> Self {
        Self {
            descriptor,
            index,
            name: name.into(),
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A decoded value, or a value about to be encoded.
///
/// Map entries are ordered pairs and keys may be any value, so maps keyed
/// by integers, enums or (with a custom null-key encoder) `Null` survive.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Binary(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Enum(EnumValue),
    Object(Object),
}

static UNTYPED_LIST: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::list(TypeDescriptor::any()));

static UNTYPED_MAP: LazyLock<TypeDescriptor> =
    LazyLock::new(|| TypeDescriptor::map(TypeDescriptor::any(), TypeDescriptor::any()));

impl Value {
    /// Builds a text value.
    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The runtime type of this value.
    ///
    /// Objects and enums report their own descriptor; scalars report the
    /// widest matching scalar kind; lists and maps are untyped.
    pub fn runtime_descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Null => TypeDescriptor::any(),
            Self::Bool(_) => TypeDescriptor::scalar(ScalarKind::Bool),
            Self::Int(_) => TypeDescriptor::scalar(ScalarKind::I64),
            Self::Float(_) => TypeDescriptor::scalar(ScalarKind::F64),
            Self::Text(_) => TypeDescriptor::scalar(ScalarKind::String),
            Self::Binary(_) => TypeDescriptor::scalar(ScalarKind::Bytes),
            Self::Uuid(_) => TypeDescriptor::scalar(ScalarKind::Uuid),
            Self::Timestamp(_) => TypeDescriptor::scalar(ScalarKind::Timestamp),
            Self::List(_) => UNTYPED_LIST.clone(),
            Self::Map(_) => UNTYPED_MAP.clone(),
            Self::Enum(value) => value.descriptor().clone(),
            Self::Object(object) => object.descriptor().clone(),
        }
    }

    /// Short name of the variant, for error messages.
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Enum(_) => "enum",
            Self::Object(_) => "object",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `null`, empty text, empty binary and empty containers.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Binary(bytes) => bytes.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[inline]
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Looks up a text-keyed entry of a map.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(key, _)| key.as_str() == Some(name))
            .map(|(_, value)| value)
    }
}

impl fmt::Display for Value {
    /// A compact, JSON-like rendering for diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Enum(v) => write!(f, "{}::{}", v.descriptor().name(), v.name()),
            Self::Object(object) => write!(f, "<{}>", object.descriptor()),
        }
    }
}
