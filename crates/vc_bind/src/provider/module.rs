use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::sync::LazyLock;

use vc_token::TokenStream;

use crate::codec::{DecodeContext, Decoder, Encoder, NullEncoder};
use crate::error::BindError;
use crate::hash::HashMap;
use crate::types::TypeDescriptor;

type DecoderFallback = Arc<dyn Fn(&TypeDescriptor) -> Option<Arc<dyn Decoder>> + Send + Sync>;
type EncoderFallback = Arc<dyn Fn(&TypeDescriptor) -> Option<Arc<dyn Encoder>> + Send + Sync>;

static NULL_ENCODER: LazyLock<NullEncoder> = LazyLock::new(NullEncoder::new);

// -----------------------------------------------------------------------------
// UnknownPropertyHandler

/// Gets a chance at a property no bean member claims.
///
/// The stream is positioned on the first token of the property's value.
/// A handler that returns `true` has consumed the value and must leave the
/// stream on its last token; one that returns `false` must not move it.
pub trait UnknownPropertyHandler: Send + Sync + 'static {
    fn handle(
        &self,
        ty: &TypeDescriptor,
        name: &str,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<bool, BindError>;
}

impl<F> UnknownPropertyHandler for F
where
    F: Fn(&TypeDescriptor, &str, &mut dyn TokenStream, &DecodeContext<'_>) -> Result<bool, BindError>
        + Send
        + Sync
        + 'static,
{
    #[inline]
    fn handle(
        &self,
        ty: &TypeDescriptor,
        name: &str,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<bool, BindError> {
        self(ty, name, stream, ctx)
    }
}

// -----------------------------------------------------------------------------
// Module

/// Registrations consumed once when a [`Provider`](crate::Provider) is built.
///
/// A module supplies codecs for exact descriptors, a fallback for types the
/// introspector does not know, unknown-property handlers, and the encoders
/// used for `null` values and `null` map keys.
///
/// # Examples
///
/// ```
/// use vc_bind::codec::FnEncoder;
/// use vc_bind::introspect::ClassRegistry;
/// use vc_bind::types::TypeDescriptor;
/// use vc_bind::{Module, Provider, Value};
/// use vc_token::json::JsonWriter;
///
/// let module = Module::new("nulls").with_null_encoder(FnEncoder::new(
///     TypeDescriptor::any(),
///     |_, sink, _| Ok(sink.write_string("n/a")?),
/// ));
/// let provider = Provider::builder(ClassRegistry::new()).module(module).build();
///
/// let mut writer = JsonWriter::new();
/// provider.encode(&Value::List(vec![Value::Null]), &mut writer).unwrap();
/// assert_eq!(writer.into_string().unwrap(), r#"["n/a"]"#);
/// ```
#[derive(Default)]
pub struct Module {
    name: String,
    decoders: HashMap<TypeDescriptor, Arc<dyn Decoder>>,
    encoders: HashMap<TypeDescriptor, Arc<dyn Encoder>>,
    decoder_fallback: Option<DecoderFallback>,
    encoder_fallback: Option<EncoderFallback>,
    unknown_property_handlers: Vec<Arc<dyn UnknownPropertyHandler>>,
    null_encoder: Option<Arc<dyn Encoder>>,
    null_key_encoder: Option<Arc<dyn Encoder>>,
}

impl Module {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decodes the decoder's own descriptor with it.
    pub fn with_decoder(mut self, decoder: impl Decoder) -> Self {
        let ty = decoder.descriptor().clone();
        self.decoders.insert(ty, Arc::new(decoder));
        self
    }

    /// Encodes the encoder's own descriptor with it.
    pub fn with_encoder(mut self, encoder: impl Encoder) -> Self {
        let ty = encoder.descriptor().clone();
        self.encoders.insert(ty, Arc::new(encoder));
        self
    }

    /// Registers one value as both decoder and encoder.
    pub fn with_codec<C: Decoder + Encoder>(mut self, codec: Arc<C>) -> Self {
        let ty = Decoder::descriptor(&*codec).clone();
        self.decoders.insert(ty.clone(), codec.clone());
        self.encoders.insert(ty, codec);
        self
    }

    /// Consulted for types the introspector does not know.
    ///
    /// Codecs returned here are cached and linked like bean codecs.
    pub fn with_decoder_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<Arc<dyn Decoder>> + Send + Sync + 'static,
    {
        self.decoder_fallback = Some(Arc::new(fallback));
        self
    }

    pub fn with_encoder_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<Arc<dyn Encoder>> + Send + Sync + 'static,
    {
        self.encoder_fallback = Some(Arc::new(fallback));
        self
    }

    /// Appends a handler; handlers are asked in registration order.
    pub fn with_unknown_property_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TypeDescriptor, &str, &mut dyn TokenStream, &DecodeContext<'_>) -> Result<bool, BindError>
            + Send
            + Sync
            + 'static,
    {
        self.unknown_property_handlers.push(Arc::new(handler));
        self
    }

    /// Writes `null` values and `null` map values.
    pub fn with_null_encoder(mut self, encoder: impl Encoder) -> Self {
        self.null_encoder = Some(Arc::new(encoder));
        self
    }

    /// Writes `null` map keys, which fail by default.
    ///
    /// The encoder must write a single string or integer.
    pub fn with_null_key_encoder(mut self, encoder: impl Encoder) -> Self {
        self.null_key_encoder = Some(Arc::new(encoder));
        self
    }

    /// Merges `other` into `self`.
    ///
    /// Codecs and null encoders of `other` win; fallbacks are chained with
    /// `self`'s asked first; handlers are appended.
    pub fn extend(&mut self, other: Module) {
        let Module {
            name,
            decoders,
            encoders,
            decoder_fallback,
            encoder_fallback,
            unknown_property_handlers,
            null_encoder,
            null_key_encoder,
        } = other;

        log::debug!("merging module `{name}` into `{}`", self.name);
        self.decoders.extend(decoders);
        self.encoders.extend(encoders);
        self.decoder_fallback = match (self.decoder_fallback.take(), decoder_fallback) {
            (Some(first), Some(second)) => Some(Arc::new(move |ty: &TypeDescriptor| {
                first(ty).or_else(|| second(ty))
            })),
            (first, second) => first.or(second),
        };
        self.encoder_fallback = match (self.encoder_fallback.take(), encoder_fallback) {
            (Some(first), Some(second)) => Some(Arc::new(move |ty: &TypeDescriptor| {
                first(ty).or_else(|| second(ty))
            })),
            (first, second) => first.or(second),
        };
        self.unknown_property_handlers.extend(unknown_property_handlers);
        if null_encoder.is_some() {
            self.null_encoder = null_encoder;
        }
        if null_key_encoder.is_some() {
            self.null_key_encoder = null_key_encoder;
        }
    }

    #[inline]
    pub fn decoder(&self, ty: &TypeDescriptor) -> Option<Arc<dyn Decoder>> {
        self.decoders.get(ty).cloned()
    }

    #[inline]
    pub fn encoder(&self, ty: &TypeDescriptor) -> Option<Arc<dyn Encoder>> {
        self.encoders.get(ty).cloned()
    }

    #[inline]
    pub fn fallback_decoder(&self, ty: &TypeDescriptor) -> Option<Arc<dyn Decoder>> {
        self.decoder_fallback.as_ref().and_then(|fallback| fallback(ty))
    }

    #[inline]
    pub fn fallback_encoder(&self, ty: &TypeDescriptor) -> Option<Arc<dyn Encoder>> {
        self.encoder_fallback.as_ref().and_then(|fallback| fallback(ty))
    }

    #[inline]
    pub fn unknown_property_handlers(&self) -> &[Arc<dyn UnknownPropertyHandler>] {
        &self.unknown_property_handlers
    }

    /// The module's null encoder, [`NullEncoder`] by default.
    #[inline]
    pub fn null_encoder(&self) -> &dyn Encoder {
        match &self.null_encoder {
            Some(encoder) => &**encoder,
            None => &*NULL_ENCODER,
        }
    }

    #[inline]
    pub fn null_key_encoder(&self) -> Option<&dyn Encoder> {
        self.null_key_encoder.as_deref()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("decoders", &self.decoders.keys().collect::<Vec<_>>())
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .field("decoder_fallback", &self.decoder_fallback.is_some())
            .field("encoder_fallback", &self.encoder_fallback.is_some())
            .field("unknown_property_handlers", &self.unknown_property_handlers.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests
