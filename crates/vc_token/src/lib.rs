#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod buffer;
mod error;
mod sink;
mod stream;
mod token;

#[cfg(feature = "json")]
pub mod json;

// -----------------------------------------------------------------------------
// Exports

pub use buffer::{BufferStream, ChainedStream, TokenBuffer};
pub use error::StreamError;
pub use sink::TokenSink;
pub use stream::TokenStream;
pub use token::{Token, TokenKind};
