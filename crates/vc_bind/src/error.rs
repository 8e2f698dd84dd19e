//! Binding errors.
//!
//! Every fallible operation returns a [`BindError`]: an [`ErrorKind`] plus the
//! location inside the bound structure where the failure happened. Locations
//! are collected while the error unwinds through nested codecs, so the
//! innermost segment is recorded first.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::{error, fmt};

use thiserror::Error;
use vc_token::{StreamError, TokenKind};

use crate::types::TypeDescriptor;

// -----------------------------------------------------------------------------
// ErrorKind

/// What went wrong, independent of where.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("No codec found for `{ty}`")]
    NoCodecFound { ty: TypeDescriptor },

    #[error("No creator found for `{ty}`")]
    NoCreatorFound { ty: TypeDescriptor },

    #[error("Conflicting creators for `{ty}`: `{first}` and `{second}`")]
    ConflictingCreators {
        ty: TypeDescriptor,
        first: String,
        second: String,
    },

    #[error("Invalid definition of `{ty}`: {message}")]
    InvalidDefinition { ty: TypeDescriptor, message: String },

    #[error("Unrecognized property `{name}` for `{ty}` (known properties: {})", known.join(", "))]
    UnrecognizedProperty {
        name: String,
        ty: TypeDescriptor,
        known: Vec<String>,
    },

    #[error("Unexpected token for `{ty}`: expected {expected}, found {}", DisplayToken(*found))]
    UnexpectedToken {
        ty: TypeDescriptor,
        expected: &'static str,
        found: Option<TokenKind>,
    },

    #[error("Cannot instantiate abstract type `{ty}` without type metadata")]
    AbstractTypeNotInstantiable { ty: TypeDescriptor },

    #[error("Unknown type id `{id}` for `{ty}`")]
    InvalidTypeId { ty: TypeDescriptor, id: String },

    #[error("Failed to instantiate `{ty}`: {cause}")]
    InstantiationFailure {
        ty: TypeDescriptor,
        #[source]
        cause: Arc<dyn error::Error + Send + Sync>,
    },

    #[error("Cannot convert to `{ty}`: {message}")]
    ValueConversionFailure { ty: TypeDescriptor, message: String },

    #[error("Null key in map `{ty}`")]
    NullKey { ty: TypeDescriptor },

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("{0}")]
    Custom(String),
}

struct DisplayToken(Option<TokenKind>);

impl fmt::Display for DisplayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(kind) => fmt::Display::fmt(&kind, f),
            None => f.pad("end of input"),
        }
    }
}

// -----------------------------------------------------------------------------
// PathSegment

/// One step into a bound structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Property(String),
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, ".{name}"),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "[{key:?}]"),
        }
    }
}

// -----------------------------------------------------------------------------
// BindError

/// The error type of every binding operation.
///
/// `BindError` is cheap to clone so that build failures can be cached and
/// returned again without rebuilding.
///
/// # Examples
///
/// ```
/// use vc_bind::error::{BindError, ErrorKind};
/// use vc_bind::types::TypeDescriptor;
///
/// let err = BindError::from(ErrorKind::NoCreatorFound { ty: TypeDescriptor::bean("User") })
///     .with_property("owner")
///     .with_index(2)
///     .with_property("items");
///
/// assert_eq!(err.path_string(), "$.items[2].owner");
/// assert!(err.is_definition_error());
/// ```
#[derive(Clone)]
pub struct BindError {
    kind: Box<ErrorKind>,
    // Innermost segment first.
    path: Vec<PathSegment>,
}

impl BindError {
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
            path: Vec::new(),
        }
    }

    /// A free-form error, typically raised by custom codecs.
    #[inline]
    pub fn custom(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Custom(message.to_string()))
    }

    /// Wraps the failure of a creator, setter or factory.
    #[inline]
    pub fn instantiation(ty: &TypeDescriptor, cause: impl error::Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::InstantiationFailure {
            ty: ty.clone(),
            cause: Arc::new(cause),
        })
    }

    /// Attributes a failure raised inside a creator body to `ty`.
    ///
    /// Errors about the input or about type definitions pass through
    /// unchanged; anything else becomes an [`ErrorKind::InstantiationFailure`]
    /// whose source is the original error.
    pub fn raised_by(self, ty: &TypeDescriptor) -> Self {
        match *self.kind {
            ErrorKind::Custom(_) => Self::instantiation(ty, self),
            ErrorKind::NoCodecFound { .. }
            | ErrorKind::NoCreatorFound { .. }
            | ErrorKind::ConflictingCreators { .. }
            | ErrorKind::InvalidDefinition { .. }
            | ErrorKind::UnrecognizedProperty { .. }
            | ErrorKind::UnexpectedToken { .. }
            | ErrorKind::AbstractTypeNotInstantiable { .. }
            | ErrorKind::InvalidTypeId { .. }
            | ErrorKind::InstantiationFailure { .. }
            | ErrorKind::ValueConversionFailure { .. }
            | ErrorKind::NullKey { .. }
            | ErrorKind::Stream(_) => self,
        }
    }

    #[inline]
    pub fn conversion(ty: &TypeDescriptor, message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::ValueConversionFailure {
            ty: ty.clone(),
            message: message.to_string(),
        })
    }

    #[inline]
    pub fn unexpected_token(
        ty: &TypeDescriptor,
        expected: &'static str,
        found: Option<TokenKind>,
    ) -> Self {
        Self::new(ErrorKind::UnexpectedToken {
            ty: ty.clone(),
            expected,
            found,
        })
    }

    #[inline]
    pub fn invalid_definition(ty: &TypeDescriptor, message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidDefinition {
            ty: ty.clone(),
            message: message.to_string(),
        })
    }

    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Path segments from the root of the structure to the failure.
    pub fn path(&self) -> impl Iterator<Item = &PathSegment> {
        self.path.iter().rev()
    }

    /// The failure location rendered as `$.a[0].b`.
    pub fn path_string(&self) -> String {
        let mut out = String::from("$");
        for segment in self.path() {
            out.push_str(&segment.to_string());
        }
        out
    }

    /// Returns `true` for errors caused by the definition of a type rather
    /// than by the data being bound. These are cached by the provider.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            *self.kind,
            ErrorKind::NoCodecFound { .. }
                | ErrorKind::NoCreatorFound { .. }
                | ErrorKind::ConflictingCreators { .. }
                | ErrorKind::InvalidDefinition { .. }
        )
    }

    #[inline]
    pub fn with_property(mut self, name: &str) -> Self {
        self.path.push(PathSegment::Property(String::from(name)));
        self
    }

    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.path.push(PathSegment::Index(index));
        self
    }

    #[inline]
    pub fn with_key(mut self, key: impl fmt::Display) -> Self {
        self.path.push(PathSegment::Key(key.to_string()));
        self
    }
}

impl From<ErrorKind> for BindError {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<StreamError> for BindError {
    #[inline]
    fn from(err: StreamError) -> Self {
        Self::new(ErrorKind::Stream(err))
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            fmt::Display::fmt(&self.kind, f)
        } else {
            write!(f, "{} (at {})", self.kind, self.path_string())
        }
    }
}

impl fmt::Debug for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindError")
            .field("kind", &self.kind)
            .field("path", &self.path_string())
            .finish()
    }
}

impl error::Error for BindError {
    #[inline]
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.kind.source()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::error::Error as _;

    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct Fire;

    #[test]
    fn instantiation_preserves_cause() {
        let err = BindError::instantiation(&TypeDescriptor::bean("Disk"), Fire);
        assert_eq!(err.to_string(), "Failed to instantiate `Disk`: disk on fire");
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");
    }

    #[test]
    fn creator_failures_name_the_type() {
        let ty = TypeDescriptor::bean("Disk");
        let err = BindError::custom("negative size").raised_by(&ty);
        let ErrorKind::InstantiationFailure { ty: failed, .. } = err.kind() else {
            panic!("unexpected error {err}");
        };
        assert_eq!(failed, &ty);
        assert_eq!(err.source().unwrap().to_string(), "negative size");

        let input = BindError::conversion(&ty, "not a number").raised_by(&ty);
        assert!(matches!(input.kind(), ErrorKind::ValueConversionFailure { .. }));
        let definition = BindError::invalid_definition(&ty, "bad").raised_by(&ty);
        assert!(definition.is_definition_error());
    }

    #[test]
    fn display_includes_path() {
        let err = BindError::custom("bad").with_key("k").with_property("map");
        assert_eq!(err.to_string(), r#"bad (at $.map["k"])"#);
        assert!(!err.is_definition_error());
    }

    #[test]
    fn stream_errors_stay_stream_errors() {
        let err = BindError::from(StreamError::UnexpectedEof);
        assert!(matches!(err.kind(), ErrorKind::Stream(StreamError::UnexpectedEof)));
        assert_eq!(err.to_string(), StreamError::UnexpectedEof.to_string());
    }
}
