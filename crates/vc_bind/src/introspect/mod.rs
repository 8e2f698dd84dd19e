//! What the engine knows about user types.
//!
//! Rust has no runtime reflection, so each bindable type describes itself
//! once through a model:
//!
//! - [`ClassModel`]: creators, settable and readable members of a bean.
//! - [`EnumModel`]: the constants of an enum.
//! - [`AbstractModel`]: the concrete types behind an abstract declaration.
//!
//! The engine reaches models through the [`Introspector`] trait.
//! [`ClassRegistry`] is the shipped implementation, filled by hand or by
//! `#[derive(Bind)]`.

// -----------------------------------------------------------------------------
// Modules

mod enum_model;
mod model;
mod naming;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use enum_model::{AbstractModel, EnumModel, TypeIdStyle};
pub use model::{
    AccessorKind, AnySetFn, ClassModel, ClassModelBuilder, CodecOverride, CreateFn, CreatorArgs,
    CreatorCandidate, CreatorMode, CreatorParam, CreatorSpec, GetFn, PropertyCandidate, SetFn,
};
pub use naming::{NamingStrategy, UnknownNamingStrategy};
pub use registry::{BindModel, Bindable, ClassRegistry};

// -----------------------------------------------------------------------------
// Introspector

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::types::TypeDescriptor;

/// Source of type models, consumed by the provider.
///
/// Only the `find_*` lookups by descriptor are required; the member
/// queries used by the bean builder default to reading the class model.
pub trait Introspector: Send + Sync + 'static {
    fn find_class(&self, ty: &TypeDescriptor) -> Option<Arc<ClassModel>>;

    fn find_enum(&self, ty: &TypeDescriptor) -> Option<Arc<EnumModel>>;

    fn find_abstract(&self, ty: &TypeDescriptor) -> Option<Arc<AbstractModel>>;

    /// Resolves a type name or declared type id.
    fn find_by_name(&self, name: &str) -> Option<TypeDescriptor>;

    /// Constructors and factories of `ty`, or `None` if `ty` is unknown.
    fn find_creators(&self, ty: &TypeDescriptor) -> Option<Vec<CreatorCandidate>> {
        self.find_class(ty).map(|model| model.creators().to_vec())
    }

    fn find_settable_members(&self, ty: &TypeDescriptor) -> Vec<PropertyCandidate> {
        self.find_class(ty)
            .map(|model| model.settable().to_vec())
            .unwrap_or_default()
    }

    fn find_readable_members(&self, ty: &TypeDescriptor) -> Vec<PropertyCandidate> {
        self.find_class(ty)
            .map(|model| model.readable().to_vec())
            .unwrap_or_default()
    }

    /// Explicit codecs for one property of `ty`.
    fn find_codec_override(&self, ty: &TypeDescriptor, property: &str) -> CodecOverride {
        let Some(model) = self.find_class(ty) else {
            return CodecOverride::default();
        };
        let mut found = CodecOverride::default();
        for candidate in model.settable().iter().chain(model.readable()) {
            if candidate.name() != property {
                continue;
            }
            if found.decoder.is_none() {
                found.decoder.clone_from(&candidate.codec().decoder);
            }
            if found.encoder.is_none() {
                found.encoder.clone_from(&candidate.codec().encoder);
            }
        }
        found
    }
}

impl<I: Introspector> Introspector for Arc<I> {
    #[inline]
    fn find_class(&self, ty: &TypeDescriptor) -> Option<Arc<ClassModel>> {
        (**self).find_class(ty)
    }

    #[inline]
    fn find_enum(&self, ty: &TypeDescriptor) -> Option<Arc<EnumModel>> {
        (**self).find_enum(ty)
    }

    #[inline]
    fn find_abstract(&self, ty: &TypeDescriptor) -> Option<Arc<AbstractModel>> {
        (**self).find_abstract(ty)
    }

    #[inline]
    fn find_by_name(&self, name: &str) -> Option<TypeDescriptor> {
        (**self).find_by_name(name)
    }

    #[inline]
    fn find_creators(&self, ty: &TypeDescriptor) -> Option<Vec<CreatorCandidate>> {
        (**self).find_creators(ty)
    }

    #[inline]
    fn find_settable_members(&self, ty: &TypeDescriptor) -> Vec<PropertyCandidate> {
        (**self).find_settable_members(ty)
    }

    #[inline]
    fn find_readable_members(&self, ty: &TypeDescriptor) -> Vec<PropertyCandidate> {
        (**self).find_readable_members(ty)
    }

    #[inline]
    fn find_codec_override(&self, ty: &TypeDescriptor, property: &str) -> CodecOverride {
        (**self).find_codec_override(ty, property)
    }
}
