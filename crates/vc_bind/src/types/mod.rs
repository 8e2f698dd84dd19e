//! Type descriptors: the identity under which codecs are resolved and cached.
//!
//! - [`TypeDescriptor`]: raw name, [`TypeKind`] and ordered generic parameters.
//! - [`ScalarKind`]: the built-in scalars served without introspection.

// -----------------------------------------------------------------------------
// Modules

mod descriptor;
mod scalar;

// -----------------------------------------------------------------------------
// Exports

pub use descriptor::{TypeDescriptor, TypeKind};
pub use scalar::ScalarKind;
