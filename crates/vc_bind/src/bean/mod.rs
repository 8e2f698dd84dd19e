//! Codecs of struct-like types.
//!
//! A bean codec is built in two phases. [`BeanCodecBuilder`] turns the
//! introspected model into a shell: the [creators](CreatorResolver), the
//! property table and the writer list. The provider publishes the shell and
//! then links it, which resolves the codec of every property. A property of
//! the bean's own type therefore finds the shell instead of recursing.

// -----------------------------------------------------------------------------
// Modules

mod buffer;
mod builder;
mod creator;
mod decoder;
mod encoder;
mod property;

// -----------------------------------------------------------------------------
// Exports

pub use buffer::{Buffered, PropertyValueBuffer};
pub use builder::BeanCodecBuilder;
pub use creator::{CreatorArg, CreatorResolver, CreatorStrategy, Creators, ScalarCreatorKind};
pub use decoder::BeanDecoder;
pub use encoder::BeanEncoder;
pub use property::{DelegateWriter, PropertyDescriptor, PropertyWriter};
