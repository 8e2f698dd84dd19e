use alloc::string::String;
use alloc::vec::Vec;

use crate::types::TypeDescriptor;
use crate::value::Typed;

// -----------------------------------------------------------------------------
// EnumModel

/// The constants of an enum type, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumModel {
    descriptor: TypeDescriptor,
    variants: Vec<String>,
}

impl EnumModel {
    pub fn new(descriptor: TypeDescriptor, variants: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            descriptor,
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn of<T: Typed>(variants: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(T::type_descriptor(), variants)
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.variants.get(index).map(String::as_str)
    }

    /// Ordinal of the constant named `name`.
    pub fn index_of(&self, name: &str, ignore_case: bool) -> Option<usize> {
        self.variants.iter().position(|variant| {
            if ignore_case {
                variant.eq_ignore_ascii_case(name)
            } else {
                variant == name
            }
        })
    }
}

// -----------------------------------------------------------------------------
// Polymorphism

/// Where the type id of a polymorphic value is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeIdStyle {
    /// A property of the object itself, e.g. `{"@type": "circle", ...}`.
    ///
    /// Values that are not objects fall back to a wrapper array.
    Property(String),
    /// `["circle", {...}]`
    WrapperArray,
    /// `{"circle": {...}}`
    WrapperObject,
}

/// An abstract type and the concrete types it may hold.
///
/// # Examples
///
/// ```
/// use vc_bind::introspect::{AbstractModel, TypeIdStyle};
/// use vc_bind::types::TypeDescriptor;
///
/// let circle = TypeDescriptor::bean("Circle");
/// let model = AbstractModel::new(TypeDescriptor::abstract_type("Shape"))
///     .subtype("circle", circle.clone())
///     .style(TypeIdStyle::WrapperArray);
///
/// assert_eq!(model.id_of(&circle), Some("circle"));
/// assert_eq!(model.subtype_of("circle"), Some(&circle));
/// assert!(model.default_impl().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractModel {
    descriptor: TypeDescriptor,
    style: Option<TypeIdStyle>,
    default_impl: Option<TypeDescriptor>,
    subtypes: Vec<(String, TypeDescriptor)>,
}

impl AbstractModel {
    #[inline]
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            style: None,
            default_impl: None,
            subtypes: Vec::new(),
        }
    }

    #[inline]
    pub fn of<T: Typed>() -> Self {
        Self::new(T::type_descriptor())
    }

    /// Registers a concrete type under `id`.
    pub fn subtype(mut self, id: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.subtypes.push((id.into(), ty));
        self
    }

    #[inline]
    pub fn subtype_typed<S: Typed>(self, id: impl Into<String>) -> Self {
        self.subtype(id, S::type_descriptor())
    }

    /// Concrete type used when the input carries no type id.
    #[inline]
    pub fn with_default_impl(mut self, ty: TypeDescriptor) -> Self {
        self.default_impl = Some(ty);
        self
    }

    /// Overrides the provider's type id style.
    #[inline]
    pub fn style(mut self, style: TypeIdStyle) -> Self {
        self.style = Some(style);
        self
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn type_id_style(&self) -> Option<&TypeIdStyle> {
        self.style.as_ref()
    }

    #[inline]
    pub fn default_impl(&self) -> Option<&TypeDescriptor> {
        self.default_impl.as_ref()
    }

    #[inline]
    pub fn subtypes(&self) -> &[(String, TypeDescriptor)] {
        &self.subtypes
    }

    /// Declared id of a concrete type.
    pub fn id_of(&self, ty: &TypeDescriptor) -> Option<&str> {
        self.subtypes
            .iter()
            .find(|(_, subtype)| subtype == ty)
            .map(|(id, _)| id.as_str())
    }

    /// Concrete type declared under `id`.
    pub fn subtype_of(&self, id: &str) -> Option<&TypeDescriptor> {
        self.subtypes
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, ty)| ty)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_lookup() {
        let model = EnumModel::new(TypeDescriptor::enumeration("Color"), ["Red", "Green"]);
        assert_eq!(model.index_of("Green", false), Some(1));
        assert_eq!(model.index_of("green", false), None);
        assert_eq!(model.index_of("green", true), Some(1));
        assert_eq!(model.name(0), Some("Red"));
        assert_eq!(model.name(2), None);
    }
}
