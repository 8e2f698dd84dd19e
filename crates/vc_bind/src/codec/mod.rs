//! Codec traits and the built-in codecs.
//!
//! A [`Decoder`] turns the tokens of one value into a [`Value`]; an
//! [`Encoder`] writes a [`Value`] as tokens. Both are shared behind `Arc`
//! and immutable once linked.
//!
//! Decoders are entered with the stream positioned on the first token of
//! their value and return positioned on its last token, so the caller's next
//! `next_token` lands on whatever follows.
//!
//! Built-in codecs:
//!
//! | Shape      | Decoder             | Encoder             |
//! |------------|---------------------|---------------------|
//! | scalars    | [`ScalarDecoder`]   | [`ScalarEncoder`]   |
//! | lists/sets | [`ListDecoder`]     | [`ListEncoder`]     |
//! | maps       | [`MapDecoder`]      | [`MapEncoder`]      |
//! | optionals  | [`OptionalDecoder`] | [`OptionalEncoder`] |
//! | enums      | [`EnumDecoder`]     | [`EnumEncoder`]     |
//! | untyped    | [`UntypedDecoder`]  | [`UntypedEncoder`]  |
//!
//! Beans and abstract types are served by [`bean`](crate::bean) and
//! [`poly`](crate::poly).

// -----------------------------------------------------------------------------
// Modules

mod container;
mod custom;
mod enums;
mod key;
mod null;
mod registry;
mod scalar;
mod slot;
mod untyped;

// -----------------------------------------------------------------------------
// Exports

pub use container::{
    ListDecoder, ListEncoder, MapDecoder, MapEncoder, OptionalDecoder, OptionalEncoder,
};
pub use custom::{FnDecoder, FnEncoder, SerdeCodec};
pub use enums::{EnumDecoder, EnumEncoder};
pub use key::{KeyDecoder, KeyEncoder};
pub use null::NullEncoder;
pub use registry::{Shape, builtin_decoder, builtin_encoder, classify};
pub use scalar::{ScalarDecoder, ScalarEncoder};
pub use slot::{CodecSlot, LinkedCodec, MonomorphicCache, ValueWriter};
pub use untyped::{UntypedDecoder, UntypedEncoder};

// -----------------------------------------------------------------------------
// Codec traits

use vc_token::{TokenKind, TokenSink, TokenStream};

use crate::config::{BindConfig, DecodeFeatures, EncodeFeatures};
use crate::error::BindError;
use crate::introspect::TypeIdStyle;
use crate::poly::TypeTag;
use crate::provider::Provider;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// The variant of a codec, used for caching decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    Scalar,
    Container,
    Bean,
    Enum,
    /// Stand-in for an abstract type.
    Placeholder,
    Untyped,
    /// Supplied by a module.
    Custom,
}

impl CodecKind {
    /// Kinds built through the provider cache.
    ///
    /// They are expensive to build, or take part in cycles.
    #[inline]
    pub const fn is_cached(self) -> bool {
        matches!(self, Self::Bean | Self::Enum | Self::Placeholder)
    }
}

/// Per-call state handed to decoders.
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    provider: &'a Provider,
}

impl<'a> DecodeContext<'a> {
    #[inline]
    pub fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    #[inline]
    pub fn provider(&self) -> &'a Provider {
        self.provider
    }

    #[inline]
    pub fn config(&self) -> &'a BindConfig {
        self.provider.config()
    }

    #[inline]
    pub fn is_enabled(&self, features: DecodeFeatures) -> bool {
        self.provider.config().decode.contains(features)
    }
}

/// Per-call state handed to encoders.
#[derive(Clone, Copy)]
pub struct EncodeContext<'a> {
    provider: &'a Provider,
}

impl<'a> EncodeContext<'a> {
    #[inline]
    pub fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    #[inline]
    pub fn provider(&self) -> &'a Provider {
        self.provider
    }

    #[inline]
    pub fn config(&self) -> &'a BindConfig {
        self.provider.config()
    }

    #[inline]
    pub fn is_enabled(&self, features: EncodeFeatures) -> bool {
        self.provider.config().encode.contains(features)
    }

    /// Writes `null` through the module's null encoder.
    #[inline]
    pub fn write_null(&self, sink: &mut dyn TokenSink) -> Result<(), BindError> {
        self.provider.module().null_encoder().encode(&Value::Null, sink, self)
    }
}

/// Reads one value from a token stream.
pub trait Decoder: Send + Sync + 'static {
    /// The type this decoder produces.
    fn descriptor(&self) -> &TypeDescriptor;

    fn kind(&self) -> CodecKind;

    /// Decodes the value starting at the current token.
    ///
    /// `null` tokens are normally intercepted by the caller, see
    /// [`decode_nullable`].
    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError>;

    /// The value of an explicit `null`.
    #[inline]
    fn null_value(&self, _ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        Ok(Value::Null)
    }

    /// The value of a missing creator argument.
    #[inline]
    fn absent_value(&self, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        self.null_value(ctx)
    }

    /// Resolves nested codecs. Called once, right after construction.
    #[inline]
    fn link(&self, _provider: &Provider) -> Result<(), BindError> {
        Ok(())
    }
}

/// Writes one value to a token sink.
pub trait Encoder: Send + Sync + 'static {
    /// The type this encoder writes.
    fn descriptor(&self) -> &TypeDescriptor;

    fn kind(&self) -> CodecKind;

    /// Encodes a non-null value.
    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError>;

    /// Encodes a value together with its polymorphic type id.
    ///
    /// The default wraps the value in an array or object. Encoders writing
    /// objects override this to support [`TypeIdStyle::Property`].
    fn encode_with_type_tag(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
        tag: &TypeTag,
    ) -> Result<(), BindError> {
        write_type_wrapper(tag, sink, |sink| self.encode(value, sink, ctx))
    }

    /// Whether `value` counts as empty for [`Inclusion::NonEmpty`](crate::config::Inclusion::NonEmpty).
    #[inline]
    fn is_empty(&self, value: &Value) -> bool {
        value.is_empty()
    }

    /// Resolves nested codecs. Called once, right after construction.
    #[inline]
    fn link(&self, _provider: &Provider) -> Result<(), BindError> {
        Ok(())
    }
}

/// Decodes the current value, mapping a `null` token to the decoder's
/// [null value](Decoder::null_value).
#[inline]
pub fn decode_nullable(
    decoder: &dyn Decoder,
    stream: &mut dyn TokenStream,
    ctx: &DecodeContext<'_>,
) -> Result<Value, BindError> {
    if stream.current_token() == Some(TokenKind::ValueNull) {
        decoder.null_value(ctx)
    } else {
        decoder.decode(stream, ctx)
    }
}


/// Writes the wrapper array or object of `tag` around `write`.
///
/// [`TypeIdStyle::Property`] uses the wrapper array, for values that are
/// not written as objects.
pub fn write_type_wrapper(
    tag: &TypeTag,
    sink: &mut dyn TokenSink,
    write: impl FnOnce(&mut dyn TokenSink) -> Result<(), BindError>,
) -> Result<(), BindError> {
    match tag.style() {
        TypeIdStyle::WrapperObject => {
            sink.write_start_object()?;
            sink.write_field_name(tag.id())?;
            write(&mut *sink)?;
            sink.write_end_object()?;
        }
        TypeIdStyle::WrapperArray | TypeIdStyle::Property(_) => {
            sink.write_start_array()?;
            sink.write_string(tag.id())?;
            write(&mut *sink)?;
            sink.write_end_array()?;
        }
    }
    Ok(())
}
