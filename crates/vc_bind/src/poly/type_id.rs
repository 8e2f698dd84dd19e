use alloc::string::{String, ToString};
use alloc::sync::Arc;

use crate::config::BindConfig;
use crate::error::{BindError, ErrorKind};
use crate::introspect::{AbstractModel, Introspector, TypeIdStyle};
use crate::types::TypeDescriptor;

// -----------------------------------------------------------------------------
// TypeTag

/// The type id of one polymorphic value and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTag {
    id: String,
    style: TypeIdStyle,
}

impl TypeTag {
    #[inline]
    pub fn new(id: impl Into<String>, style: TypeIdStyle) -> Self {
        Self {
            id: id.into(),
            style,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn style(&self) -> &TypeIdStyle {
        &self.style
    }
}

// -----------------------------------------------------------------------------
// TypeIdResolver

/// Maps between the concrete types of one abstract declaration and their ids.
///
/// Ids are looked up in order:
///
/// 1. the subtypes declared by the [`AbstractModel`];
/// 2. the `type_id` of the concrete class model;
/// 3. the display name of the concrete type.
///
/// The reverse lookup tries the declared subtypes, then any type the
/// introspector knows by that name.
///
/// # Examples
///
/// ```
/// use vc_bind::config::BindConfig;
/// use vc_bind::introspect::{AbstractModel, ClassRegistry, TypeIdStyle};
/// use vc_bind::poly::TypeIdResolver;
/// use vc_bind::types::TypeDescriptor;
///
/// let shape = TypeDescriptor::abstract_type("Shape");
/// let circle = TypeDescriptor::bean("Circle");
/// let model = AbstractModel::new(shape.clone()).subtype("circle", circle.clone());
///
/// let registry = ClassRegistry::new();
/// let resolver = TypeIdResolver::new(shape, Some(model.into()), &BindConfig::default());
///
/// assert_eq!(resolver.style(), &TypeIdStyle::Property("@type".into()));
/// assert_eq!(resolver.id_of(&circle, &registry), "circle");
/// assert_eq!(resolver.type_of("circle", &registry).unwrap(), circle);
/// assert!(resolver.type_of("square", &registry).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TypeIdResolver {
    declared: TypeDescriptor,
    model: Option<Arc<AbstractModel>>,
    style: TypeIdStyle,
}

impl TypeIdResolver {
    /// A resolver for `declared`.
    ///
    /// Without a model, or when the model does not pick a style, ids are
    /// written as the configured type property.
    pub fn new(
        declared: TypeDescriptor,
        model: Option<Arc<AbstractModel>>,
        config: &BindConfig,
    ) -> Self {
        let style = model
            .as_ref()
            .and_then(|model| model.type_id_style().cloned())
            .unwrap_or_else(|| TypeIdStyle::Property(config.type_property.clone()));
        Self {
            declared,
            model,
            style,
        }
    }

    #[inline]
    pub fn declared(&self) -> &TypeDescriptor {
        &self.declared
    }

    #[inline]
    pub fn style(&self) -> &TypeIdStyle {
        &self.style
    }

    /// Concrete type used when the input carries no id.
    #[inline]
    pub fn default_impl(&self) -> Option<&TypeDescriptor> {
        self.model.as_ref().and_then(|model| model.default_impl())
    }

    /// The id written for a value of runtime type `runtime`.
    pub fn id_of(&self, runtime: &TypeDescriptor, introspector: &dyn Introspector) -> String {
        if let Some(id) = self.model.as_ref().and_then(|model| model.id_of(runtime)) {
            return String::from(id);
        }
        if let Some(class) = introspector.find_class(runtime)
            && let Some(id) = class.type_id()
        {
            return String::from(id);
        }
        runtime.to_string()
    }

    #[inline]
    pub fn tag_for(&self, runtime: &TypeDescriptor, introspector: &dyn Introspector) -> TypeTag {
        TypeTag::new(self.id_of(runtime, introspector), self.style.clone())
    }

    /// The concrete type written under `id`.
    pub fn type_of(
        &self,
        id: &str,
        introspector: &dyn Introspector,
    ) -> Result<TypeDescriptor, BindError> {
        if let Some(ty) = self.model.as_ref().and_then(|model| model.subtype_of(id)) {
            return Ok(ty.clone());
        }
        match introspector.find_by_name(id) {
            Some(ty) if ty != self.declared => Ok(ty),
            _ => Err(ErrorKind::InvalidTypeId {
                ty: self.declared.clone(),
                id: String::from(id),
            }
            .into()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{BindModel, ClassModel, ClassRegistry};
    use crate::value::Typed;

    #[derive(Clone, Debug, Default)]
    struct Square;

    impl Typed for Square {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Square")
        }
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Class(
            ClassModel::builder::<Square>()
                .default_creator(Square::default)
                .type_id("sq")
                .build(),
        ));
        registry
    }

    #[test]
    fn class_type_id_and_display_name() {
        let registry = registry();
        let resolver = TypeIdResolver::new(
            TypeDescriptor::abstract_type("Shape"),
            None,
            &BindConfig::default().with_type_property("kind"),
        );

        assert_eq!(resolver.style(), &TypeIdStyle::Property("kind".into()));
        assert_eq!(resolver.id_of(&Square::type_descriptor(), &registry), "sq");
        assert_eq!(resolver.id_of(&TypeDescriptor::bean("Blob"), &registry), "Blob");

        assert_eq!(resolver.type_of("sq", &registry).unwrap(), Square::type_descriptor());
        assert_eq!(resolver.type_of("Square", &registry).unwrap(), Square::type_descriptor());
    }

    #[test]
    fn unknown_ids_name_the_declared_type() {
        let registry = registry();
        let shape = TypeDescriptor::abstract_type("Shape");
        let model = AbstractModel::new(shape.clone()).style(TypeIdStyle::WrapperObject);
        let resolver = TypeIdResolver::new(shape, Some(Arc::new(model)), &BindConfig::default());

        assert_eq!(resolver.style(), &TypeIdStyle::WrapperObject);
        let err = resolver.type_of("hexagon", &registry).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidTypeId { ty, id } if ty.name() == "Shape" && id == "hexagon"
        ));
    }
}
