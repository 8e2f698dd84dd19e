use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use vc_token::Token;

use crate::error::{BindError, ErrorKind};
use crate::introspect::{CreatorCandidate, CreatorMode};
use crate::types::{ScalarKind, TypeDescriptor, TypeKind};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ScalarCreatorKind

/// The scalar a single-argument creator accepts, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarCreatorKind {
    String,
    Int,
    Long,
    Double,
    Boolean,
}

impl ScalarCreatorKind {
    pub const ALL: [Self; 5] = [Self::String, Self::Int, Self::Long, Self::Double, Self::Boolean];

    /// The bucket of a scalar parameter type, `None` for scalars bound by
    /// delegation (bytes, uuid, timestamps).
    pub const fn of(kind: ScalarKind) -> Option<Self> {
        Some(match kind {
            ScalarKind::String | ScalarKind::Char => Self::String,
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::U8 | ScalarKind::U16 => {
                Self::Int
            }
            ScalarKind::I64 | ScalarKind::U32 | ScalarKind::U64 => Self::Long,
            ScalarKind::F32 | ScalarKind::F64 => Self::Double,
            ScalarKind::Bool => Self::Boolean,
            ScalarKind::Bytes | ScalarKind::Uuid | ScalarKind::Timestamp => return None,
        })
    }

    /// The argument this kind takes from `token`, if it accepts the token.
    pub fn argument(self, token: &Token) -> Option<Value> {
        match (self, token) {
            (Self::String, Token::String(text)) => Some(Value::Text(text.clone())),
            (Self::Int, Token::Int(value)) if i32::try_from(*value).is_ok() => {
                Some(Value::Int(*value))
            }
            (Self::Long, Token::Int(value)) => Some(Value::Int(*value)),
            (Self::Double, Token::Float(value)) => Some(Value::Float(*value)),
            (Self::Boolean, Token::Bool(value)) => Some(Value::Bool(*value)),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for ScalarCreatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// CreatorStrategy

/// One named argument of a property-based creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorArg {
    pub name: String,
    pub descriptor: TypeDescriptor,
}

/// How instances of a bean type are created.
#[derive(Debug, Clone)]
pub enum CreatorStrategy {
    /// No-argument creator, properties are set afterwards.
    Default(CreatorCandidate),
    /// Single scalar argument taken from a scalar token.
    FromScalar {
        kind: ScalarCreatorKind,
        creator: CreatorCandidate,
    },
    /// Single argument receiving the whole value, decoded as `intermediate`.
    Delegating {
        intermediate: TypeDescriptor,
        creator: CreatorCandidate,
    },
    /// Named arguments, indexed in declaration order.
    PropertyBased {
        args: Vec<CreatorArg>,
        creator: CreatorCandidate,
    },
}

impl CreatorStrategy {
    #[inline]
    pub fn creator(&self) -> &CreatorCandidate {
        match self {
            Self::Default(creator)
            | Self::FromScalar { creator, .. }
            | Self::Delegating { creator, .. }
            | Self::PropertyBased { creator, .. } => creator,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default(_) => "default",
            Self::FromScalar { .. } => "scalar",
            Self::Delegating { .. } => "delegating",
            Self::PropertyBased { .. } => "property-based",
        }
    }
}

/// The creators selected for one bean type.
///
/// Scalar creators that lost to the primary strategy stay available so
/// that scalar input can still be bound.
#[derive(Debug, Clone)]
pub struct Creators {
    primary: CreatorStrategy,
    default: Option<CreatorCandidate>,
    scalars: Vec<(ScalarCreatorKind, CreatorCandidate)>,
}

impl Creators {
    #[inline]
    pub fn primary(&self) -> &CreatorStrategy {
        &self.primary
    }

    /// The no-argument creator, kept unless the primary strategy is
    /// property-based or delegating.
    #[inline]
    pub fn default_creator(&self) -> Option<&CreatorCandidate> {
        self.default.as_ref()
    }

    /// Scalar creators in precedence order.
    #[inline]
    pub fn scalars(&self) -> &[(ScalarCreatorKind, CreatorCandidate)] {
        &self.scalars
    }

    /// The scalar creator accepting `token`, with its argument.
    ///
    /// Integers go to an `Int` creator when they fit, to a `Long` creator
    /// otherwise.
    pub fn for_token(&self, token: &Token) -> Option<(&CreatorCandidate, Value)> {
        self.scalars
            .iter()
            .find_map(|(kind, creator)| kind.argument(token).map(|arg| (creator, arg)))
    }

    pub(crate) fn replace_primary(&mut self, primary: CreatorStrategy) {
        self.primary = primary;
    }
}

// -----------------------------------------------------------------------------
// CreatorResolver

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Delegating,
    Properties,
    Scalar(ScalarCreatorKind),
    Default,
}

/// Selects the creators of a bean type.
///
/// Candidates are sorted into buckets by arity and first-parameter kind:
///
/// | Candidate | Bucket |
/// |---|---|
/// | no parameters | default |
/// | one parameter, explicitly delegating, or an unnamed non-scalar | delegating |
/// | several parameters, or one named parameter of an explicit creator | property-based |
/// | one scalar parameter | scalar, by kind |
///
/// Precedence is delegating, then property-based, then scalar (`String`
/// first), then default. Each bucket holds one candidate: an explicit
/// candidate replaces an implicit one, and two of the same explicitness are
/// [`ErrorKind::ConflictingCreators`].
///
/// # Examples
///
/// ```
/// use vc_bind::bean::{CreatorResolver, CreatorStrategy};
/// use vc_bind::introspect::{ClassModel, CreatorSpec};
/// use vc_bind::Typed;
///
/// #[derive(Clone, Debug, Default)]
/// struct Point { x: i32, y: i32 }
///
/// impl Typed for Point {
///     fn type_descriptor() -> vc_bind::TypeDescriptor {
///         vc_bind::TypeDescriptor::bean("Point")
///     }
/// }
///
/// let model = ClassModel::builder::<Point>()
///     .default_creator(Point::default)
///     .creator(CreatorSpec::new("Point::new").param::<i32>("x").param::<i32>("y"), |args| {
///         Ok(Point { x: args.take(0)?, y: args.take(1)? })
///     })
///     .build();
///
/// let creators = CreatorResolver::new(model.descriptor()).resolve(model.creators()).unwrap();
/// assert!(matches!(creators.primary(), CreatorStrategy::PropertyBased { args, .. } if args.len() == 2));
/// // Property-based creation discards the default creator.
/// assert!(creators.default_creator().is_none());
/// ```
#[derive(Debug)]
pub struct CreatorResolver<'a> {
    ty: &'a TypeDescriptor,
}

impl<'a> CreatorResolver<'a> {
    #[inline]
    pub fn new(ty: &'a TypeDescriptor) -> Self {
        Self { ty }
    }

    fn bucket(&self, candidate: &CreatorCandidate) -> Result<Bucket, BindError> {
        let params = candidate.params();
        let bucket = match (candidate.mode(), params) {
            (_, []) if candidate.mode() != CreatorMode::Delegating => Bucket::Default,
            (CreatorMode::Delegating, [_]) => Bucket::Delegating,
            (CreatorMode::Delegating, _) => {
                return Err(BindError::invalid_definition(
                    self.ty,
                    format!("delegating creator `{}` must take one argument", candidate.name()),
                ));
            }
            (CreatorMode::Properties, _) => Bucket::Properties,
            (CreatorMode::Auto, [param]) => {
                if candidate.is_explicit() && param.name().is_some() {
                    Bucket::Properties
                } else {
                    match param.descriptor().kind() {
                        TypeKind::Scalar(kind) => {
                            ScalarCreatorKind::of(kind).map_or(Bucket::Delegating, Bucket::Scalar)
                        }
                        _ => Bucket::Delegating,
                    }
                }
            }
            (CreatorMode::Auto, _) => Bucket::Properties,
        };

        if bucket == Bucket::Properties
            && let Some(index) = params.iter().position(|param| param.name().is_none())
        {
            return Err(BindError::invalid_definition(
                self.ty,
                format!(
                    "argument {index} of property-based creator `{}` has no name",
                    candidate.name()
                ),
            ));
        }
        Ok(bucket)
    }

    /// Selects exactly one primary strategy among `candidates`.
    pub fn resolve(&self, candidates: &[CreatorCandidate]) -> Result<Creators, BindError> {
        let mut buckets: Vec<(Bucket, &CreatorCandidate)> = Vec::new();
        for candidate in candidates {
            let bucket = self.bucket(candidate)?;
            match buckets.iter_mut().find(|(b, _)| *b == bucket) {
                None => buckets.push((bucket, candidate)),
                Some((_, existing)) => {
                    if candidate.is_explicit() == existing.is_explicit() {
                        return Err(ErrorKind::ConflictingCreators {
                            ty: self.ty.clone(),
                            first: String::from(existing.name()),
                            second: String::from(candidate.name()),
                        }
                        .into());
                    }
                    if candidate.is_explicit() {
                        *existing = candidate;
                    }
                }
            }
        }
        buckets.sort_by_key(|(bucket, _)| *bucket);

        let Some(&(top, creator)) = buckets.first() else {
            return Err(ErrorKind::NoCreatorFound { ty: self.ty.clone() }.into());
        };
        let creator = creator.clone();
        let primary = match top {
            Bucket::Delegating => CreatorStrategy::Delegating {
                intermediate: creator.params()[0].descriptor().clone(),
                creator,
            },
            Bucket::Properties => CreatorStrategy::PropertyBased {
                args: creator
                    .params()
                    .iter()
                    .map(|param| CreatorArg {
                        name: String::from(param.name().unwrap_or_default()),
                        descriptor: param.descriptor().clone(),
                    })
                    .collect(),
                creator,
            },
            Bucket::Scalar(kind) => CreatorStrategy::FromScalar { kind, creator },
            Bucket::Default => CreatorStrategy::Default(creator),
        };

        let keeps_default = !matches!(
            primary,
            CreatorStrategy::Delegating { .. } | CreatorStrategy::PropertyBased { .. }
        );
        let default = buckets
            .iter()
            .find(|(bucket, _)| keeps_default && *bucket == Bucket::Default)
            .map(|(_, creator)| (*creator).clone());
        let scalars = buckets
            .iter()
            .filter_map(|(bucket, creator)| match bucket {
                Bucket::Scalar(kind) => Some((*kind, (*creator).clone())),
                _ => None,
            })
            .collect();

        log::trace!("`{}` is created by a {} creator", self.ty, primary.name());
        Ok(Creators {
            primary,
            default,
            scalars,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
