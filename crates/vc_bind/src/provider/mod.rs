//! Codec resolution.
//!
//! A [`Provider`] owns the configuration, the introspector and the merged
//! [`Module`] registrations, and caches the codecs it builds from them.
//! Resolution asks, in order: the module's exact codecs, the built-in
//! scalar and untyped codecs, the container codecs (built around element
//! codecs, never cached) and finally the [cache](CodecCache), which builds
//! bean, enum and placeholder codecs, or asks the module's fallback.

// -----------------------------------------------------------------------------
// Modules

mod cache;
mod module;

// -----------------------------------------------------------------------------
// Exports

pub use cache::CodecCache;
pub use module::{Module, UnknownPropertyHandler};

// -----------------------------------------------------------------------------
// Provider

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use vc_token::{TokenSink, TokenStream};

use crate::bean::BeanCodecBuilder;
use crate::codec::{
    CodecSlot, DecodeContext, Decoder, EncodeContext, Encoder, EnumDecoder, EnumEncoder,
    ListDecoder, ListEncoder, MapDecoder, MapEncoder, OptionalDecoder, OptionalEncoder, Shape,
    ValueWriter, builtin_decoder, builtin_encoder, classify, decode_nullable,
};
use crate::config::BindConfig;
use crate::error::{BindError, ErrorKind};
use crate::introspect::Introspector;
use crate::poly::{PolymorphicDecoder, PolymorphicEncoder, TypeIdResolver, TypeTag};
use crate::types::{TypeDescriptor, TypeKind};
use crate::value::{FromValue, ToValue, Typed, Value};

/// Entry point of data binding.
///
/// A provider is immutable once built and can be shared between threads;
/// its codec caches fill up on first use.
///
/// # Examples
///
/// ```
/// use vc_bind::{Bind, Provider};
/// use vc_bind::introspect::ClassRegistry;
/// use vc_token::json::{self, JsonWriter};
///
/// #[derive(Bind, Debug, Clone, PartialEq, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let mut registry = ClassRegistry::new();
/// registry.register::<Point>();
/// let provider = Provider::new(registry);
///
/// let mut stream = json::parse(r#"{"y":2,"x":1}"#).unwrap();
/// let point: Point = provider.decode_as(&mut stream).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
///
/// let mut writer = JsonWriter::new();
/// provider.encode_value(&point, &mut writer).unwrap();
/// assert_eq!(writer.into_string().unwrap(), r#"{"x":1,"y":2}"#);
/// ```
pub struct Provider {
    config: BindConfig,
    introspector: Box<dyn Introspector>,
    module: Module,
    decoders: CodecCache<dyn Decoder>,
    encoders: CodecCache<dyn Encoder>,
}

impl Provider {
    /// A provider with the default configuration and no module.
    #[inline]
    pub fn new(introspector: impl Introspector) -> Self {
        Self::builder(introspector).build()
    }

    #[inline]
    pub fn builder(introspector: impl Introspector) -> ProviderBuilder {
        ProviderBuilder {
            config: BindConfig::default(),
            introspector: Box::new(introspector),
            module: Module::new("default"),
        }
    }

    #[inline]
    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    #[inline]
    pub fn introspector(&self) -> &dyn Introspector {
        &*self.introspector
    }

    #[inline]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The linked decoder of `ty`.
    #[inline]
    pub fn resolve_decoder(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Decoder>, BindError> {
        <dyn Decoder as CodecFamily>::resolve(self, ty)
    }

    /// The linked encoder of `ty`.
    #[inline]
    pub fn resolve_encoder(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Encoder>, BindError> {
        <dyn Encoder as CodecFamily>::resolve(self, ty)
    }

    /// Decodes one value of type `ty`.
    ///
    /// The stream is advanced to its first token if it has none yet. On
    /// success it is left on the value's last token.
    pub fn decode(&self, ty: &TypeDescriptor, stream: &mut dyn TokenStream) -> Result<Value, BindError> {
        if stream.current().is_none() {
            stream.expect_next()?;
        }
        let decoder = self.resolve_decoder(ty)?;
        decode_nullable(&*decoder, stream, &DecodeContext::new(self))
    }

    /// Decodes one `T`.
    pub fn decode_as<T: Typed + FromValue>(&self, stream: &mut dyn TokenStream) -> Result<T, BindError> {
        let value = self.decode(&T::type_descriptor(), stream)?;
        T::from_value(value)
    }

    /// Writes `value` by its runtime type.
    #[inline]
    pub fn encode(&self, value: &Value, sink: &mut dyn TokenSink) -> Result<(), BindError> {
        self.encode_as(&TypeDescriptor::any(), value, sink)
    }

    /// Writes `value` as declared type `ty`.
    ///
    /// Abstract declarations write the type id of the value's runtime type.
    pub fn encode_as(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        sink: &mut dyn TokenSink,
    ) -> Result<(), BindError> {
        let writer = ValueWriter::for_type(ty.clone());
        writer.link(self)?;
        writer.write(value, sink, &EncodeContext::new(self))
    }

    /// Writes a `T`.
    pub fn encode_value<T: Typed + ToValue>(&self, value: &T, sink: &mut dyn TokenSink) -> Result<(), BindError> {
        self.encode_as(&T::type_descriptor(), &value.to_value(), sink)
    }

    /// The type id written for runtime type `runtime` where `declared` is
    /// expected.
    pub fn type_tag(&self, declared: &TypeDescriptor, runtime: &TypeDescriptor) -> Result<TypeTag, BindError> {
        Ok(self.type_id_resolver(declared).tag_for(runtime, self.introspector()))
    }

    /// Drops every cached codec.
    ///
    /// Codecs held elsewhere remain usable; the next lookup of a type
    /// rebuilds it.
    pub fn flush(&self) {
        self.decoders.flush();
        self.encoders.flush();
        log::debug!("flushed codec caches");
    }

    fn type_id_resolver(&self, declared: &TypeDescriptor) -> TypeIdResolver {
        TypeIdResolver::new(
            declared.clone(),
            self.introspector.find_abstract(declared),
            &self.config,
        )
    }

    /// Whether the introspector has a class model or creators for `ty`.
    #[inline]
    fn knows(&self, ty: &TypeDescriptor) -> bool {
        self.introspector.find_creators(ty).is_some()
    }

    fn build_decoder(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Decoder>, BindError> {
        match classify(ty) {
            Shape::Enum => {
                if let Some(model) = self.introspector.find_enum(ty) {
                    return Ok(Arc::new(EnumDecoder::new(model)));
                }
            }
            Shape::Placeholder => {
                return Ok(Arc::new(PolymorphicDecoder::new(self.type_id_resolver(ty))));
            }
            Shape::Bean if self.knows(ty) => {
                let decoder = BeanCodecBuilder::new(ty, self.introspector()).build_decoder()?;
                return Ok(Arc::new(decoder));
            }
            _ => {}
        }
        self.module
            .fallback_decoder(ty)
            .ok_or_else(|| ErrorKind::NoCodecFound { ty: ty.clone() }.into())
    }

    fn build_encoder(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Encoder>, BindError> {
        match classify(ty) {
            Shape::Enum => {
                if let Some(model) = self.introspector.find_enum(ty) {
                    return Ok(Arc::new(EnumEncoder::new(model)));
                }
            }
            Shape::Placeholder => {
                return Ok(Arc::new(PolymorphicEncoder::new(ty.clone())));
            }
            Shape::Bean if self.knows(ty) => {
                let encoder = BeanCodecBuilder::new(ty, self.introspector()).build_encoder()?;
                return Ok(Arc::new(encoder));
            }
            _ => {}
        }
        self.module
            .fallback_encoder(ty)
            .ok_or_else(|| ErrorKind::NoCodecFound { ty: ty.clone() }.into())
    }

    fn container_decoder(ty: &TypeDescriptor) -> Result<Arc<dyn Decoder>, BindError> {
        Ok(match ty.kind() {
            TypeKind::Map => Arc::new(MapDecoder::new(ty.clone())?),
            TypeKind::Optional => Arc::new(OptionalDecoder::new(ty.clone())),
            _ => Arc::new(ListDecoder::new(ty.clone())),
        })
    }

    fn container_encoder(ty: &TypeDescriptor) -> Arc<dyn Encoder> {
        match ty.kind() {
            TypeKind::Map => Arc::new(MapEncoder::new(ty.clone())),
            TypeKind::Optional => Arc::new(OptionalEncoder::new(ty.clone())),
            _ => Arc::new(ListEncoder::new(ty.clone())),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("config", &self.config)
            .field("module", &self.module)
            .field("decoders", &self.decoders)
            .field("encoders", &self.encoders)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ProviderBuilder

/// Collects configuration and modules for a [`Provider`].
#[must_use]
pub struct ProviderBuilder {
    config: BindConfig,
    introspector: Box<dyn Introspector>,
    module: Module,
}

impl ProviderBuilder {
    #[inline]
    pub fn config(mut self, config: BindConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a module. Later modules override the codecs of earlier ones.
    #[inline]
    pub fn module(mut self, module: Module) -> Self {
        self.module.extend(module);
        self
    }

    pub fn build(self) -> Provider {
        Provider {
            config: self.config,
            introspector: self.introspector,
            module: self.module,
            decoders: CodecCache::new(),
            encoders: CodecCache::new(),
        }
    }
}

// -----------------------------------------------------------------------------
// CodecFamily

/// Decoders or encoders, resolved the same way.
pub trait CodecFamily: Send + Sync + 'static {
    /// The slot of `ty`, weak if `ty` is still being built on this thread.
    fn resolve_slot(provider: &Provider, ty: &TypeDescriptor) -> Result<CodecSlot<Self>, BindError>;

    /// The linked codec of `ty`.
    fn resolve(provider: &Provider, ty: &TypeDescriptor) -> Result<Arc<Self>, BindError> {
        match Self::resolve_slot(provider, ty)? {
            CodecSlot::Strong(codec) => Ok(codec),
            CodecSlot::Cyclic { codec, ty } => codec.upgrade().ok_or_else(|| {
                BindError::invalid_definition(&ty, "codec was dropped while being built")
            }),
        }
    }
}

impl CodecFamily for dyn Decoder {
    fn resolve_slot(provider: &Provider, ty: &TypeDescriptor) -> Result<CodecSlot<Self>, BindError> {
        if let Some(decoder) = provider.module.decoder(ty) {
            return Ok(CodecSlot::Strong(decoder));
        }
        if let Some(decoder) = builtin_decoder(ty) {
            return Ok(CodecSlot::Strong(decoder));
        }
        if classify(ty) == Shape::Container {
            let decoder = Provider::container_decoder(ty)?;
            decoder.link(provider)?;
            return Ok(CodecSlot::Strong(decoder));
        }
        provider.decoders.resolve(
            ty,
            || provider.build_decoder(ty),
            |decoder| decoder.link(provider),
        )
    }
}

impl CodecFamily for dyn Encoder {
    fn resolve_slot(provider: &Provider, ty: &TypeDescriptor) -> Result<CodecSlot<Self>, BindError> {
        if let Some(encoder) = provider.module.encoder(ty) {
            return Ok(CodecSlot::Strong(encoder));
        }
        if let Some(encoder) = builtin_encoder(ty) {
            return Ok(CodecSlot::Strong(encoder));
        }
        if classify(ty) == Shape::Container {
            let encoder = Provider::container_encoder(ty);
            encoder.link(provider)?;
            return Ok(CodecSlot::Strong(encoder));
        }
        provider.encoders.resolve(
            ty,
            || provider.build_encoder(ty),
            |encoder| encoder.link(provider),
        )
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecKind, FnDecoder};
    use crate::introspect::{BindModel, ClassModel, ClassRegistry, EnumModel};
    use alloc::string::String;
    use vc_token::json::{self, JsonWriter};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Node {
        label: String,
    }

    impl Typed for Node {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Node")
        }
    }

    fn node() -> TypeDescriptor {
        Node::type_descriptor()
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Class(
            ClassModel::builder::<Node>()
                .default_creator(Node::default)
                .field("label", |n: &Node| &n.label, |n: &mut Node, v| n.label = v)
                .build(),
        ));
        registry
    }

    #[test]
    fn cached_codecs_are_shared() {
        let provider = Provider::new(registry());
        let a = provider.resolve_decoder(&node()).unwrap();
        let b = provider.resolve_decoder(&node()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.kind(), CodecKind::Bean);

        provider.flush();
        let c = provider.resolve_decoder(&node()).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn containers_are_not_cached() {
        let provider = Provider::new(registry());
        let ty = TypeDescriptor::list(node());
        let a = provider.resolve_encoder(&ty).unwrap();
        let b = provider.resolve_encoder(&ty).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.kind(), CodecKind::Container);
    }

    #[test]
    fn unknown_types_fail() {
        let provider = Provider::new(registry());
        let err = provider
            .resolve_decoder(&TypeDescriptor::bean("Missing"))
            .err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::NoCodecFound { .. }));
        assert!(err.is_definition_error());

        let err = provider
            .resolve_encoder(&TypeDescriptor::enumeration("Color"))
            .err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::NoCodecFound { .. }));
    }

    #[test]
    fn module_codecs_win() {
        let module = Module::new("override")
            .with_decoder(FnDecoder::new(node(), |stream, _| {
                stream.skip_children()?;
                Ok(Value::text("overridden"))
            }));
        let provider = Provider::builder(registry()).module(module).build();

        let mut stream = json::parse(r#"{"label":"x"}"#).unwrap();
        let value = provider.decode(&node(), &mut stream).unwrap();
        assert_eq!(value.as_str(), Some("overridden"));
    }

    #[test]
    fn fallback_serves_unknown_types() {
        let module = Module::new("fallback").with_decoder_fallback(|ty| {
            (ty.name() == "Opaque").then(|| {
                Arc::new(FnDecoder::new(ty.clone(), |stream, _| {
                    Ok(Value::text(stream.text()?))
                })) as Arc<dyn Decoder>
            })
        });
        let provider = Provider::builder(ClassRegistry::new()).module(module).build();
        let opaque = TypeDescriptor::bean("Opaque");

        let mut stream = json::parse(r#""blob""#).unwrap();
        let value = provider.decode(&opaque, &mut stream).unwrap();
        assert_eq!(value.as_str(), Some("blob"));

        let a = provider.resolve_decoder(&opaque).unwrap();
        let b = provider.resolve_decoder(&opaque).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn enums_round_trip() {
        let color = TypeDescriptor::enumeration("Color");
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Enum(EnumModel::new(color.clone(), ["Red", "Green"])));
        let provider = Provider::new(registry);

        let mut stream = json::parse(r#""Green""#).unwrap();
        let value = provider.decode(&color, &mut stream).unwrap();

        let mut writer = JsonWriter::new();
        provider.encode_as(&color, &value, &mut writer).unwrap();
        assert_eq!(writer.into_string().unwrap(), r#""Green""#);
    }

    #[test]
    fn typed_round_trip() {
        let provider = Provider::new(registry());
        let mut stream = json::parse(r#"{"label":"root"}"#).unwrap();
        let value = provider.decode(&node(), &mut stream).unwrap();
        assert_eq!(
            value.as_object().and_then(|o| o.downcast_ref::<Node>()),
            Some(&Node { label: "root".into() })
        );

        let mut writer = JsonWriter::new();
        provider.encode_as(&node(), &value, &mut writer).unwrap();
        assert_eq!(writer.into_string().unwrap(), r#"{"label":"root"}"#);
    }

    #[test]
    fn null_decodes_to_null() {
        let provider = Provider::new(registry());
        let mut stream = json::parse("null").unwrap();
        assert!(provider.decode(&node(), &mut stream).unwrap().is_null());
    }
}
