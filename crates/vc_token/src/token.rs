use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

// -----------------------------------------------------------------------------
// TokenKind

/// The kind of a [`Token`], without its payload.
///
/// This is what [`TokenStream::next_token`](crate::TokenStream::next_token)
/// reports; the payload is read through the stream's scalar accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    ValueString,
    ValueNumberInt,
    ValueNumberFloat,
    ValueTrue,
    ValueFalse,
    ValueNull,
    ValueEmbedded,
}

impl TokenKind {
    /// Returns `true` for `StartObject` and `StartArray`.
    #[inline]
    pub const fn is_struct_start(self) -> bool {
        matches!(self, Self::StartObject | Self::StartArray)
    }

    /// Returns `true` for `EndObject` and `EndArray`.
    #[inline]
    pub const fn is_struct_end(self) -> bool {
        matches!(self, Self::EndObject | Self::EndArray)
    }

    /// Returns `true` for every value token that is neither a container
    /// boundary nor a field name.
    #[inline]
    pub const fn is_scalar_value(self) -> bool {
        matches!(
            self,
            Self::ValueString
                | Self::ValueNumberInt
                | Self::ValueNumberFloat
                | Self::ValueTrue
                | Self::ValueFalse
                | Self::ValueNull
                | Self::ValueEmbedded
        )
    }

    /// Returns `true` for `ValueNumberInt` and `ValueNumberFloat`.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::ValueNumberInt | Self::ValueNumberFloat)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartObject => f.pad("StartObject"),
            Self::EndObject => f.pad("EndObject"),
            Self::StartArray => f.pad("StartArray"),
            Self::EndArray => f.pad("EndArray"),
            Self::FieldName => f.pad("FieldName"),
            Self::ValueString => f.pad("ValueString"),
            Self::ValueNumberInt => f.pad("ValueNumberInt"),
            Self::ValueNumberFloat => f.pad("ValueNumberFloat"),
            Self::ValueTrue => f.pad("ValueTrue"),
            Self::ValueFalse => f.pad("ValueFalse"),
            Self::ValueNull => f.pad("ValueNull"),
            Self::ValueEmbedded => f.pad("ValueEmbedded"),
        }
    }
}

// -----------------------------------------------------------------------------
// Token

/// A single token with its payload.
///
/// [`TokenBuffer`](crate::TokenBuffer) stores these, and every
/// [`TokenSink`](crate::TokenSink) can accept one through `write_token`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName(String),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Embedded(Vec<u8>),
}

impl Token {
    /// Returns the [`TokenKind`] of this token.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_token::{Token, TokenKind};
    ///
    /// assert_eq!(Token::Bool(false).kind(), TokenKind::ValueFalse);
    /// assert_eq!(Token::Int(3).kind(), TokenKind::ValueNumberInt);
    /// ```
    pub const fn kind(&self) -> TokenKind {
        match self {
            Self::StartObject => TokenKind::StartObject,
            Self::EndObject => TokenKind::EndObject,
            Self::StartArray => TokenKind::StartArray,
            Self::EndArray => TokenKind::EndArray,
            Self::FieldName(_) => TokenKind::FieldName,
            Self::String(_) => TokenKind::ValueString,
            Self::Int(_) => TokenKind::ValueNumberInt,
            Self::Float(_) => TokenKind::ValueNumberFloat,
            Self::Bool(true) => TokenKind::ValueTrue,
            Self::Bool(false) => TokenKind::ValueFalse,
            Self::Null => TokenKind::ValueNull,
            Self::Embedded(_) => TokenKind::ValueEmbedded,
        }
    }
}
