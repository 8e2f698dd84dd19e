use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use std::collections::{HashMap as StdHashMap, HashSet as StdHashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::hash::{HashMap, HashSet};
use crate::introspect::{AbstractModel, ClassModel, EnumModel, Introspector, NamingStrategy};
use crate::types::TypeDescriptor;
use crate::value::{Bytes, Typed, Value};

// -----------------------------------------------------------------------------
// Bindable

/// The model a type contributes to a [`ClassRegistry`].
#[derive(Debug, Clone)]
pub enum BindModel {
    Class(ClassModel),
    Enum(EnumModel),
    Abstract(AbstractModel),
}

impl BindModel {
    pub fn descriptor(&self) -> &TypeDescriptor {
        match self {
            Self::Class(model) => model.descriptor(),
            Self::Enum(model) => model.descriptor(),
            Self::Abstract(model) => model.descriptor(),
        }
    }
}

/// A type that can be registered in a [`ClassRegistry`].
///
/// Implemented by [`#[derive(Bind)]`](crate::derive::Bind), and for the
/// built-in scalars and containers, which have no model of their own but
/// register their element types.
pub trait Bindable: Typed {
    /// The model of this type, `None` for types bound by built-in codecs.
    fn bind_model() -> Option<BindModel>;

    /// Registers the types this type depends on.
    #[inline]
    fn register_dependencies(_registry: &mut ClassRegistry) {}
}

// -----------------------------------------------------------------------------
// ClassRegistry

/// The shipped [`Introspector`]: a table of models keyed by descriptor.
///
/// Types are also indexed by their display name and declared type id, used
/// to resolve the type ids of polymorphic values. Names shared by two types
/// are ambiguous and resolve to nothing.
///
/// # Examples
///
/// ```
/// use vc_bind::introspect::{ClassRegistry, Introspector};
/// use vc_bind::{Bind, TypeDescriptor};
///
/// #[derive(Bind, Clone, Debug, Default)]
/// struct Tag { label: String }
///
/// #[derive(Bind, Clone, Debug, Default)]
/// struct Post { title: String, tags: Vec<Tag> }
///
/// let mut registry = ClassRegistry::new();
/// registry.register::<Post>();
///
/// // The main type and its dependencies.
/// assert!(registry.find_class(&TypeDescriptor::bean("Post")).is_some());
/// assert!(registry.find_class(&TypeDescriptor::bean("Tag")).is_some());
/// assert_eq!(registry.find_by_name("Tag"), Some(TypeDescriptor::bean("Tag")));
/// ```
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<TypeDescriptor, Arc<ClassModel>>,
    enums: HashMap<TypeDescriptor, Arc<EnumModel>>,
    abstracts: HashMap<TypeDescriptor, Arc<AbstractModel>>,
    registered: HashSet<TypeDescriptor>,
    name_to_type: HashMap<String, TypeDescriptor>,
    ambiguous_names: HashSet<String>,
    naming: Option<NamingStrategy>,
}

impl ClassRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `strategy` to every class model registered afterwards that
    /// does not carry its own.
    #[inline]
    pub fn with_naming(mut self, strategy: NamingStrategy) -> Self {
        self.naming = Some(strategy);
        self
    }

    fn add_name(&mut self, name: String, ty: &TypeDescriptor) {
        if self.ambiguous_names.contains(&name) {
            return;
        }
        match self.name_to_type.get(&name) {
            Some(existing) if existing != ty => {
                log::debug!("type name `{name}` is ambiguous");
                self.name_to_type.remove(&name);
                self.ambiguous_names.insert(name);
            }
            Some(_) => {}
            None => {
                self.name_to_type.insert(name, ty.clone());
            }
        }
    }

    /// Inserts or overwrites a model.
    ///
    /// This does _not_ register dependencies; use [`register`](Self::register)
    /// for that.
    pub fn insert(&mut self, model: BindModel) {
        let ty = model.descriptor().clone();
        self.add_name(ty.to_string(), &ty);
        self.registered.insert(ty.clone());
        match model {
            BindModel::Class(mut model) => {
                if model.naming().is_none()
                    && let Some(strategy) = self.naming
                {
                    model = model.with_naming(strategy);
                }
                if let Some(id) = model.type_id() {
                    self.add_name(id.to_string(), &ty);
                }
                self.classes.insert(ty, Arc::new(model));
            }
            BindModel::Enum(model) => {
                self.enums.insert(ty, Arc::new(model));
            }
            BindModel::Abstract(model) => {
                self.abstracts.insert(ty, Arc::new(model));
            }
        }
    }

    /// Registers `T` and, recursively, its dependencies.
    ///
    /// Each type is registered once; registering it again does nothing.
    pub fn register<T: Bindable>(&mut self) -> &mut Self {
        if self.registered.insert(T::type_descriptor()) {
            if let Some(model) = T::bind_model() {
                self.insert(model);
            }
            T::register_dependencies(self);
        }
        self
    }

    /// Registers every non-generic type deriving `Bind`.
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    /// Repeated calls are cheap and do not insert duplicates.
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            crate::__macro_exports::auto_register::register_all(self);
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Whether `ty` has been registered, with or without a model.
    #[inline]
    pub fn contains(&self, ty: &TypeDescriptor) -> bool {
        self.registered.contains(ty)
    }

    /// Number of registered models.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len() + self.enums.len() + self.abstracts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when `name` is shared by several types.
    #[inline]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(name)
    }
}

impl Introspector for ClassRegistry {
    #[inline]
    fn find_class(&self, ty: &TypeDescriptor) -> Option<Arc<ClassModel>> {
        self.classes.get(ty).cloned()
    }

    #[inline]
    fn find_enum(&self, ty: &TypeDescriptor) -> Option<Arc<EnumModel>> {
        self.enums.get(ty).cloned()
    }

    #[inline]
    fn find_abstract(&self, ty: &TypeDescriptor) -> Option<Arc<AbstractModel>> {
        self.abstracts.get(ty).cloned()
    }

    #[inline]
    fn find_by_name(&self, name: &str) -> Option<TypeDescriptor> {
        self.name_to_type.get(name).cloned()
    }
}

// -----------------------------------------------------------------------------
// Built-in impls

macro_rules! impl_leaf_bindable {
    ($($ty:ty),* $(,)?) => {$(
        impl Bindable for $ty {
            #[inline]
            fn bind_model() -> Option<BindModel> {
                None
            }
        }
    )*};
}

impl_leaf_bindable!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String, Bytes, Uuid,
    DateTime<Utc>, Value,
);

macro_rules! impl_element_bindable {
    ($($ty:ident<T $(: $($bound:path),+)?>),* $(,)?) => {$(
        impl<T: Bindable $($(+ $bound)+)?> Bindable for $ty<T> {
            #[inline]
            fn bind_model() -> Option<BindModel> {
                None
            }

            #[inline]
            fn register_dependencies(registry: &mut ClassRegistry) {
                registry.register::<T>();
            }
        }
    )*};
}

impl_element_bindable!(Option<T>, Box<T>, Vec<T>, VecDeque<T>, BTreeSet<T: Ord>);

impl<T: Bindable + Eq + Hash, S: BuildHasher> Bindable for StdHashSet<T, S> {
    #[inline]
    fn bind_model() -> Option<BindModel> {
        None
    }

    #[inline]
    fn register_dependencies(registry: &mut ClassRegistry) {
        registry.register::<T>();
    }
}

impl<K: Bindable, V: Bindable, S> Bindable for StdHashMap<K, V, S> {
    #[inline]
    fn bind_model() -> Option<BindModel> {
        None
    }

    #[inline]
    fn register_dependencies(registry: &mut ClassRegistry) {
        registry.register::<K>();
        registry.register::<V>();
    }
}

impl<K: Bindable, V: Bindable> Bindable for BTreeMap<K, V> {
    #[inline]
    fn bind_model() -> Option<BindModel> {
        None
    }

    #[inline]
    fn register_dependencies(registry: &mut ClassRegistry) {
        registry.register::<K>();
        registry.register::<V>();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::TypeIdStyle;

    #[test]
    fn ambiguous_names_resolve_to_nothing() {
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Enum(EnumModel::new(
            TypeDescriptor::enumeration("Kind"),
            ["A"],
        )));
        registry.insert(BindModel::Abstract(AbstractModel::new(
            TypeDescriptor::abstract_type("Kind"),
        )));
        registry.insert(BindModel::Abstract(
            AbstractModel::new(TypeDescriptor::abstract_type("Shape")).style(TypeIdStyle::WrapperArray),
        ));

        assert!(registry.is_ambiguous("Kind"));
        assert_eq!(registry.find_by_name("Kind"), None);
        assert_eq!(
            registry.find_by_name("Shape"),
            Some(TypeDescriptor::abstract_type("Shape"))
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn containers_register_elements_only() {
        let mut registry = ClassRegistry::new();
        registry.register::<Vec<Option<String>>>();
        assert!(registry.contains(&TypeDescriptor::of::<String>()));
        assert!(registry.contains(&TypeDescriptor::of::<Option<String>>()));
        assert!(registry.is_empty());
    }
}
