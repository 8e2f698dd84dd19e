use alloc::format;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use vc_token::{TokenSink, TokenStream, json};

use crate::codec::{CodecKind, DecodeContext, Decoder, EncodeContext, Encoder};
use crate::error::BindError;
use crate::types::TypeDescriptor;
use crate::value::{Object, Typed, Value};

type DecodeFn =
    Arc<dyn Fn(&mut dyn TokenStream, &DecodeContext<'_>) -> Result<Value, BindError> + Send + Sync>;

type EncodeFn =
    Arc<dyn Fn(&Value, &mut dyn TokenSink, &EncodeContext<'_>) -> Result<(), BindError> + Send + Sync>;

// -----------------------------------------------------------------------------
// Closure codecs

/// A decoder backed by a closure.
///
/// # Examples
///
/// ```
/// use vc_bind::codec::FnDecoder;
/// use vc_bind::types::TypeDescriptor;
/// use vc_bind::{Module, Provider, Value};
/// use vc_bind::introspect::ClassRegistry;
/// use vc_token::{TokenStream, json};
///
/// let celsius = TypeDescriptor::bean("Celsius");
/// let module = Module::new("units").with_decoder(FnDecoder::new(celsius.clone(), |stream, _| {
///     let text = stream.text()?;
///     let degrees: f64 = text.trim_end_matches("°C").parse().map_err(vc_bind::BindError::custom)?;
///     Ok(Value::Float(degrees))
/// }));
///
/// let provider = Provider::builder(ClassRegistry::new()).module(module).build();
/// let mut stream = json::parse(r#""21.5°C""#).unwrap();
/// let value = provider.decode(&celsius, &mut stream).unwrap();
/// assert_eq!(value.as_f64(), Some(21.5));
/// ```
pub struct FnDecoder {
    descriptor: TypeDescriptor,
    decode: DecodeFn,
}

impl FnDecoder {
    pub fn new<F>(descriptor: TypeDescriptor, decode: F) -> Self
    where
        F: Fn(&mut dyn TokenStream, &DecodeContext<'_>) -> Result<Value, BindError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            descriptor,
            decode: Arc::new(decode),
        }
    }
}

impl Decoder for FnDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Custom
    }

    #[inline]
    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        (self.decode)(stream, ctx)
    }
}

impl fmt::Debug for FnDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDecoder")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// An encoder backed by a closure.
pub struct FnEncoder {
    descriptor: TypeDescriptor,
    encode: EncodeFn,
}

impl FnEncoder {
    pub fn new<F>(descriptor: TypeDescriptor, encode: F) -> Self
    where
        F: Fn(&Value, &mut dyn TokenSink, &EncodeContext<'_>) -> Result<(), BindError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            descriptor,
            encode: Arc::new(encode),
        }
    }
}

impl Encoder for FnEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Custom
    }

    #[inline]
    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        (self.encode)(value, sink, ctx)
    }
}

impl fmt::Debug for FnEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEncoder")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// SerdeCodec

/// Binds a serde type through the JSON adapter of `vc_token`.
///
/// Values travel as [`Object`]s holding a `T`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use serde::{Deserialize, Serialize};
/// use vc_bind::codec::SerdeCodec;
/// use vc_bind::introspect::ClassRegistry;
/// use vc_bind::types::TypeDescriptor;
/// use vc_bind::{Module, Provider};
/// use vc_token::json;
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Version { major: u32, minor: u32 }
///
/// let ty = TypeDescriptor::bean("Version");
/// let codec = Arc::new(SerdeCodec::<Version>::new(ty.clone()));
/// let module = Module::new("serde").with_codec(codec);
/// let provider = Provider::builder(ClassRegistry::new()).module(module).build();
///
/// let mut stream = json::parse(r#"{"major": 1, "minor": 4}"#).unwrap();
/// let value = provider.decode(&ty, &mut stream).unwrap();
/// let version = value.as_object().unwrap().downcast_ref::<Version>().unwrap();
/// assert_eq!(version, &Version { major: 1, minor: 4 });
/// ```
pub struct SerdeCodec<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    #[inline]
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            _marker: PhantomData,
        }
    }
}

impl<T: Typed> SerdeCodec<T> {
    /// A codec registered under `T`'s own descriptor.
    #[inline]
    pub fn typed() -> Self {
        Self::new(T::type_descriptor())
    }
}

impl<T> Decoder for SerdeCodec<T>
where
    T: DeserializeOwned + Any + Clone + fmt::Debug + Send + Sync,
{
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Custom
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        _ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let value: T = json::deserialize_from(stream)
            .map_err(|err| BindError::conversion(&self.descriptor, err))?;
        Ok(Value::Object(Object::with_descriptor(
            self.descriptor.clone(),
            value,
        )))
    }
}

impl<T> Encoder for SerdeCodec<T>
where
    T: Serialize + Any + Send + Sync,
{
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Custom
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        _ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let Some(inner) = value.as_object().and_then(Object::downcast_ref::<T>) else {
            return Err(BindError::conversion(
                &self.descriptor,
                format!("cannot write a {} value", value.variant_name()),
            ));
        };
        json::serialize_into(inner, sink)?;
        Ok(())
    }
}

impl<T> fmt::Debug for SerdeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeCodec")
            .field("descriptor", &self.descriptor)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}
