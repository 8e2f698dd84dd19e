use alloc::string::String;

use thiserror::Error;

use crate::TokenKind;

// -----------------------------------------------------------------------------
// StreamError

/// Errors raised by token streams and sinks.
///
/// These describe malformed input or misuse of the stream itself,
/// never a mismatch between data and a bound type.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum StreamError {
    #[error("Unexpected end of token input")]
    UnexpectedEof,

    #[error("No current token, call `next_token` first")]
    NoCurrentToken,

    #[error("Token mismatch: expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: TokenKind,
    },

    #[error("Unbalanced structure: {0}")]
    Unbalanced(&'static str),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Number {0} is not representable")]
    NumberOutOfRange(String),

    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("{0}")]
    Custom(String),
}

impl StreamError {
    #[inline]
    pub(crate) fn mismatch(expected: &'static str, found: TokenKind) -> Self {
        Self::Mismatch { expected, found }
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for StreamError {
    #[inline]
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(alloc::format!("{value}"))
    }
}
