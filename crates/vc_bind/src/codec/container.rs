use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use vc_token::{TokenKind, TokenSink, TokenStream};

use crate::codec::{
    CodecKind, DecodeContext, Decoder, EncodeContext, Encoder, KeyDecoder, KeyEncoder, LinkedCodec,
    ValueWriter, decode_nullable,
};
use crate::config::{DecodeFeatures, EncodeFeatures};
use crate::error::BindError;
use crate::provider::Provider;
use crate::types::TypeDescriptor;
use crate::value::Value;

fn element_of(ty: &TypeDescriptor) -> TypeDescriptor {
    ty.element().cloned().unwrap_or_else(TypeDescriptor::any)
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> BindError {
    BindError::conversion(ty, format!("cannot write a {} value", value.variant_name()))
}

// -----------------------------------------------------------------------------
// Lists

/// Decoder of lists, sets and arrays.
///
/// With `ACCEPT_SINGLE_VALUE_AS_ARRAY`, a lone value decodes as a
/// one-element list.
#[derive(Debug)]
pub struct ListDecoder {
    descriptor: TypeDescriptor,
    element: LinkedCodec<dyn Decoder>,
}

impl ListDecoder {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        let element = LinkedCodec::new(element_of(&descriptor));
        Self {
            descriptor,
            element,
        }
    }

    fn decode_elements(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let element = self.element.get(ctx.provider())?;
        let mut items = Vec::new();
        loop {
            if stream.expect_next()? == TokenKind::EndArray {
                break;
            }
            let index = items.len();
            let item = decode_nullable(&*element, stream, ctx).map_err(|err| err.with_index(index))?;
            items.push(item);
        }
        Ok(Value::List(items))
    }
}

impl Decoder for ListDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Container
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        match stream.current_token() {
            Some(TokenKind::StartArray) => self.decode_elements(stream, ctx),
            Some(kind)
                if !kind.is_struct_end()
                    && kind != TokenKind::FieldName
                    && ctx.is_enabled(DecodeFeatures::ACCEPT_SINGLE_VALUE_AS_ARRAY) =>
            {
                let element = self.element.get(ctx.provider())?;
                let item = decode_nullable(&*element, stream, ctx).map_err(|err| err.with_index(0))?;
                Ok(Value::List(alloc::vec![item]))
            }
            found => Err(BindError::unexpected_token(&self.descriptor, "array", found)),
        }
    }

    #[inline]
    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.element.link(provider)
    }
}

/// Encoder of lists, sets and arrays.
#[derive(Debug)]
pub struct ListEncoder {
    descriptor: TypeDescriptor,
    element: ValueWriter,
}

impl ListEncoder {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        let element = ValueWriter::for_type(element_of(&descriptor));
        Self {
            descriptor,
            element,
        }
    }
}

impl Encoder for ListEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Container
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let Value::List(items) = value else {
            return Err(mismatch(&self.descriptor, value));
        };
        sink.write_start_array()?;
        for (index, item) in items.iter().enumerate() {
            self.element
                .write(item, sink, ctx)
                .map_err(|err| err.with_index(index))?;
        }
        sink.write_end_array()?;
        Ok(())
    }

    #[inline]
    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.element.link(provider)
    }
}

// -----------------------------------------------------------------------------
// Maps

/// Decoder of maps, read from objects.
#[derive(Debug)]
pub struct MapDecoder {
    descriptor: TypeDescriptor,
    key: KeyDecoder,
    value: LinkedCodec<dyn Decoder>,
}

impl MapDecoder {
    pub fn new(descriptor: TypeDescriptor) -> Result<Self, BindError> {
        let key_ty = descriptor.key().cloned().unwrap_or_else(TypeDescriptor::any);
        let value_ty = descriptor.value().cloned().unwrap_or_else(TypeDescriptor::any);
        Ok(Self {
            key: KeyDecoder::for_type(&descriptor, &key_ty)?,
            value: LinkedCodec::new(value_ty),
            descriptor,
        })
    }
}

impl Decoder for MapDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Container
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        if stream.current_token() != Some(TokenKind::StartObject) {
            return Err(BindError::unexpected_token(
                &self.descriptor,
                "object",
                stream.current_token(),
            ));
        }
        let decoder = self.value.get(ctx.provider())?;
        let mut entries = Vec::new();
        loop {
            match stream.expect_next()? {
                TokenKind::EndObject => break,
                TokenKind::FieldName => {}
                found => {
                    return Err(BindError::unexpected_token(
                        &self.descriptor,
                        "field name",
                        Some(found),
                    ));
                }
            }
            let name: String = stream.text_owned()?;
            let key = self.key.decode(&name, ctx).map_err(|err| err.with_key(&name))?;
            stream.expect_next()?;
            let value = decode_nullable(&*decoder, stream, ctx).map_err(|err| err.with_key(&name))?;
            entries.push((key, value));
        }
        Ok(Value::Map(entries))
    }

    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.key.link(provider)?;
        self.value.link(provider)
    }
}

/// Encoder of maps, written as objects.
///
/// Entries with a `null` value are dropped unless `WRITE_NULL_MAP_VALUES`
/// is set; `ORDER_MAP_ENTRIES_BY_KEYS` sorts entries by their rendered key.
#[derive(Debug)]
pub struct MapEncoder {
    descriptor: TypeDescriptor,
    key: KeyEncoder,
    value: ValueWriter,
}

impl MapEncoder {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        let value_ty = descriptor.value().cloned().unwrap_or_else(TypeDescriptor::any);
        Self {
            key: KeyEncoder::new(descriptor.clone()),
            value: ValueWriter::for_type(value_ty),
            descriptor,
        }
    }
}

/// Writes map entries as an object.
pub(crate) fn write_entries(
    entries: &[(Value, Value)],
    key: &KeyEncoder,
    sink: &mut dyn TokenSink,
    ctx: &EncodeContext<'_>,
    mut write_value: impl FnMut(&Value, &mut dyn TokenSink) -> Result<(), BindError>,
) -> Result<(), BindError> {
    let write_nulls = ctx.is_enabled(EncodeFeatures::WRITE_NULL_MAP_VALUES);
    let mut rendered = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        if v.is_null() && !write_nulls {
            continue;
        }
        rendered.push((key.encode(k, ctx)?, v));
    }
    if ctx.is_enabled(EncodeFeatures::ORDER_MAP_ENTRIES_BY_KEYS) {
        rendered.sort_by(|a, b| a.0.cmp(&b.0));
    }

    sink.write_start_object()?;
    for (name, value) in rendered {
        sink.write_field_name(&name)?;
        write_value(value, &mut *sink).map_err(|err| err.with_key(&name))?;
    }
    sink.write_end_object()?;
    Ok(())
}

impl Encoder for MapEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Container
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let Value::Map(entries) = value else {
            return Err(mismatch(&self.descriptor, value));
        };
        write_entries(entries, &self.key, sink, ctx, |value, sink| {
            self.value.write(value, sink, ctx)
        })
    }

    #[inline]
    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.value.link(provider)
    }
}

// -----------------------------------------------------------------------------
// Optionals

/// Decoder of `Option<T>`: `null` is `None`, anything else is `T`.
#[derive(Debug)]
pub struct OptionalDecoder {
    descriptor: TypeDescriptor,
    inner: LinkedCodec<dyn Decoder>,
}

impl OptionalDecoder {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        let inner = LinkedCodec::new(element_of(&descriptor));
        Self { descriptor, inner }
    }
}

impl Decoder for OptionalDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Container
    }

    #[inline]
    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        self.inner.get(ctx.provider())?.decode(stream, ctx)
    }

    #[inline]
    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.inner.link(provider)
    }
}

/// Encoder of `Option<T>`.
#[derive(Debug)]
pub struct OptionalEncoder {
    descriptor: TypeDescriptor,
    inner: ValueWriter,
}

impl OptionalEncoder {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        let inner = ValueWriter::for_type(element_of(&descriptor));
        Self { descriptor, inner }
    }
}

impl Encoder for OptionalEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Container
    }

    #[inline]
    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        self.inner.write(value, sink, ctx)
    }

    #[inline]
    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.inner.link(provider)
    }
}

// -----------------------------------------------------------------------------
// Tests
