//! Polymorphic values: abstract declarations and their type ids.
//!
//! A value declared with an [`Abstract`](crate::types::TypeKind::Abstract)
//! type carries the id of its concrete type next to its data. Where the id
//! goes is a [`TypeIdStyle`](crate::introspect::TypeIdStyle):
//!
//! ```text
//! Property("@type")   {"@type": "circle", "radius": 2}
//! WrapperArray        ["circle", {"radius": 2}]
//! WrapperObject       {"circle": {"radius": 2}}
//! ```
//!
//! [`PolymorphicDecoder`] is the placeholder codec of abstract types: it
//! reads the id, then hands the value to the decoder of the concrete type.

// -----------------------------------------------------------------------------
// Modules

mod decoder;
mod encoder;
mod type_id;

// -----------------------------------------------------------------------------
// Exports

pub use decoder::PolymorphicDecoder;
pub use encoder::PolymorphicEncoder;
pub use type_id::{TypeIdResolver, TypeTag};
