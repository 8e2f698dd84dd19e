use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::sync::LazyLock;

use crate::types::ScalarKind;

// -----------------------------------------------------------------------------
// TypeKind

/// The shape of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar(ScalarKind),
    List,
    Set,
    Array,
    Map,
    Optional,
    Enum,
    /// A struct-like type with creators and properties.
    Bean,
    /// A type that cannot be instantiated without embedded type metadata.
    Abstract,
    /// Untyped: values bind to their natural representation.
    Any,
}

impl TypeKind {
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::List | Self::Set | Self::Array | Self::Map | Self::Optional
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => f.pad(kind.name()),
            Self::List => f.pad("List"),
            Self::Set => f.pad("Set"),
            Self::Array => f.pad("Array"),
            Self::Map => f.pad("Map"),
            Self::Optional => f.pad("Optional"),
            Self::Enum => f.pad("Enum"),
            Self::Bean => f.pad("Bean"),
            Self::Abstract => f.pad("Abstract"),
            Self::Any => f.pad("Any"),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

#[derive(PartialEq, Eq, Hash)]
struct DescriptorInner {
    name: Box<str>,
    kind: TypeKind,
    params: Vec<TypeDescriptor>,
}

/// Identity of a bound type: raw name, kind and generic parameters.
///
/// Descriptors are immutable and cheap to clone. Equality and hashing are
/// structural, so two independently built descriptors for `List<Point>`
/// address the same cached codec.
///
/// # Examples
///
/// ```
/// use vc_bind::types::{ScalarKind, TypeDescriptor};
///
/// let a = TypeDescriptor::list(TypeDescriptor::bean("Point"));
/// let b = TypeDescriptor::list(TypeDescriptor::bean("Point"));
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "List<Point>");
/// assert_eq!(a.element().unwrap().name(), "Point");
///
/// let map = TypeDescriptor::map(
///     TypeDescriptor::scalar(ScalarKind::String),
///     TypeDescriptor::scalar(ScalarKind::I32),
/// );
/// assert_eq!(map.key().unwrap().name(), "String");
/// assert_eq!(map.value().unwrap().name(), "i32");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor(Arc<DescriptorInner>);

impl TypeDescriptor {
    fn new(name: impl Into<Box<str>>, kind: TypeKind, params: Vec<TypeDescriptor>) -> Self {
        Self(Arc::new(DescriptorInner {
            name: name.into(),
            kind,
            params,
        }))
    }

    /// Descriptor of a built-in scalar.
    ///
    /// Scalar descriptors are interned, so this only bumps a reference count.
    #[inline]
    pub fn scalar(kind: ScalarKind) -> Self {
        static SCALARS: LazyLock<[TypeDescriptor; 16]> = LazyLock::new(|| {
            ScalarKind::ALL.map(|kind| {
                TypeDescriptor::new(kind.name(), TypeKind::Scalar(kind), Vec::new())
            })
        });
        SCALARS[kind as usize].clone()
    }

    #[inline]
    pub fn list(element: TypeDescriptor) -> Self {
        Self::new("List", TypeKind::List, alloc::vec![element])
    }

    #[inline]
    pub fn set(element: TypeDescriptor) -> Self {
        Self::new("Set", TypeKind::Set, alloc::vec![element])
    }

    #[inline]
    pub fn array(element: TypeDescriptor) -> Self {
        Self::new("Array", TypeKind::Array, alloc::vec![element])
    }

    #[inline]
    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::new("Map", TypeKind::Map, alloc::vec![key, value])
    }

    #[inline]
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::new("Option", TypeKind::Optional, alloc::vec![inner])
    }

    /// A non-generic bean type.
    #[inline]
    pub fn bean(name: impl Into<Box<str>>) -> Self {
        Self::new(name, TypeKind::Bean, Vec::new())
    }

    /// A generic bean type, e.g. `Page<User>`.
    #[inline]
    pub fn bean_with_params(name: impl Into<Box<str>>, params: Vec<TypeDescriptor>) -> Self {
        Self::new(name, TypeKind::Bean, params)
    }

    #[inline]
    pub fn enumeration(name: impl Into<Box<str>>) -> Self {
        Self::new(name, TypeKind::Enum, Vec::new())
    }

    #[inline]
    pub fn abstract_type(name: impl Into<Box<str>>) -> Self {
        Self::new(name, TypeKind::Abstract, Vec::new())
    }

    /// The untyped descriptor. Interned like scalars.
    #[inline]
    pub fn any() -> Self {
        static ANY: LazyLock<TypeDescriptor> =
            LazyLock::new(|| TypeDescriptor::new("Any", TypeKind::Any, Vec::new()));
        ANY.clone()
    }

    /// Descriptor of a Rust type.
    #[inline]
    pub fn of<T: crate::value::Typed + ?Sized>() -> Self {
        T::type_descriptor()
    }

    /// The raw type name, without generic parameters.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    /// Ordered generic parameters.
    #[inline]
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.0.params
    }

    /// Element type of a list, set, array or optional.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self.kind() {
            TypeKind::List | TypeKind::Set | TypeKind::Array | TypeKind::Optional => {
                self.0.params.first()
            }
            _ => None,
        }
    }

    /// Key type of a map.
    pub fn key(&self) -> Option<&TypeDescriptor> {
        match self.kind() {
            TypeKind::Map => self.0.params.first(),
            _ => None,
        }
    }

    /// Value type of a map.
    pub fn value(&self) -> Option<&TypeDescriptor> {
        match self.kind() {
            TypeKind::Map => self.0.params.get(1),
            _ => None,
        }
    }

    #[inline]
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind() {
            TypeKind::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.kind() == TypeKind::Enum
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind(), TypeKind::Scalar(_))
    }

    /// Returns `true` for scalar kinds without a null state.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        self.scalar_kind().is_some_and(ScalarKind::is_primitive)
    }

    /// Concrete types have a single runtime shape, so their codec can be
    /// resolved once from the declared type. `Abstract` and `Any` are not.
    #[inline]
    pub fn is_concrete(&self) -> bool {
        !matches!(self.kind(), TypeKind::Abstract | TypeKind::Any)
    }

    /// Returns `true` when both descriptors share one allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let [first, rest @ ..] = self.params() {
            write!(f, "<{first}")?;
            for param in rest {
                write!(f, ", {param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDescriptor({self}: {})", self.kind())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashSet;

    #[test]
    fn structural_identity() {
        let a = TypeDescriptor::bean_with_params(
            "Page",
            alloc::vec![TypeDescriptor::scalar(ScalarKind::String)],
        );
        let b = TypeDescriptor::bean_with_params(
            "Page",
            alloc::vec![TypeDescriptor::scalar(ScalarKind::String)],
        );
        let c = TypeDescriptor::bean("Page");

        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::default();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn kind_accessors() {
        let opt = TypeDescriptor::optional(TypeDescriptor::scalar(ScalarKind::I32));
        assert!(opt.is_container());
        assert!(opt.element().unwrap().is_primitive());
        assert!(opt.key().is_none());

        assert!(!TypeDescriptor::any().is_concrete());
        assert!(!TypeDescriptor::abstract_type("Shape").is_concrete());
        assert!(TypeDescriptor::bean("Circle").is_concrete());
        assert!(!TypeDescriptor::scalar(ScalarKind::String).is_primitive());
    }

    #[test]
    fn display_nested_params() {
        let ty = TypeDescriptor::map(
            TypeDescriptor::scalar(ScalarKind::String),
            TypeDescriptor::list(TypeDescriptor::bean("User")),
        );
        assert_eq!(ty.to_string(), "Map<String, List<User>>");
    }
}
