#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro emits `::vc_bind::...` paths, which must also resolve
// inside this crate's own tests and doc tests.
extern crate self as vc_bind;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod hash;

pub mod bean;
pub mod codec;
pub mod config;
pub mod error;
pub mod introspect;
pub mod poly;
pub mod provider;
pub mod types;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use config::BindConfig;
pub use error::{BindError, ErrorKind};
pub use provider::{Module, Provider};
pub use types::TypeDescriptor;
pub use value::{FromValue, ToValue, Typed, Value};
pub use vc_bind_derive as derive;
pub use vc_bind_derive::Bind;
