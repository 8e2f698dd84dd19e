use alloc::vec::Vec;

use vc_token::{Token, TokenKind, TokenSink, TokenStream};

use crate::codec::container::write_entries;
use crate::codec::{CodecKind, DecodeContext, Decoder, EncodeContext, Encoder, KeyEncoder, builtin_encoder};
use crate::error::{BindError, ErrorKind};
use crate::types::TypeDescriptor;
use crate::value::Value;

// -----------------------------------------------------------------------------
// UntypedDecoder

/// Decodes any value into its natural representation.
///
/// Objects become text-keyed [`Value::Map`]s, arrays [`Value::List`]s and
/// embedded payloads [`Value::Binary`].
#[derive(Debug)]
pub struct UntypedDecoder {
    descriptor: TypeDescriptor,
}

impl UntypedDecoder {
    #[inline]
    pub fn new() -> Self {
        Self {
            descriptor: TypeDescriptor::any(),
        }
    }
}

impl Decoder for UntypedDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Untyped
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let token = match stream.current() {
            Some(token) => token,
            None => return Err(BindError::unexpected_token(&self.descriptor, "a value", None)),
        };
        Ok(match token {
            Token::String(text) => Value::Text(text.clone()),
            Token::Int(value) => Value::Int(*value),
            Token::Float(value) => Value::Float(*value),
            Token::Bool(value) => Value::Bool(*value),
            Token::Null => Value::Null,
            Token::Embedded(bytes) => Value::Binary(bytes.clone()),
            Token::StartArray => {
                let mut items = Vec::new();
                while stream.expect_next()? != TokenKind::EndArray {
                    let index = items.len();
                    items.push(self.decode(stream, ctx).map_err(|err| err.with_index(index))?);
                }
                Value::List(items)
            }
            Token::StartObject => {
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
                    let name = stream.text_owned()?;
                    stream.expect_next()?;
                    let value = self.decode(stream, ctx).map_err(|err| err.with_key(&name))?;
                    entries.push((Value::Text(name), value));
                }
                Value::Map(entries)
            }
            Token::EndArray | Token::EndObject | Token::FieldName(_) => {
                return Err(BindError::unexpected_token(
                    &self.descriptor,
                    "a value",
                    stream.current_token(),
                ));
            }
        })
    }
}

// -----------------------------------------------------------------------------
// UntypedEncoder

/// Encodes any value by its runtime shape.
///
/// Objects and enums are written by the encoder of their runtime type,
/// resolved through the provider on each call. The encoder is shared by
/// every provider and keeps no per-provider state.
#[derive(Debug)]
pub struct UntypedEncoder {
    descriptor: TypeDescriptor,
    key: KeyEncoder,
}

impl UntypedEncoder {
    #[inline]
    pub fn new() -> Self {
        Self {
            descriptor: TypeDescriptor::any(),
            key: KeyEncoder::new(TypeDescriptor::map(TypeDescriptor::any(), TypeDescriptor::any())),
        }
    }

    fn write(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        if value.is_null() {
            ctx.write_null(sink)
        } else {
            self.encode(value, sink, ctx)
        }
    }
}

impl Encoder for UntypedEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Untyped
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        match value {
            Value::Null => ctx.write_null(sink)?,
            Value::Bool(v) => sink.write_bool(*v)?,
            Value::Int(v) => sink.write_int(*v)?,
            Value::Float(v) => sink.write_float(*v)?,
            Value::Text(v) => sink.write_string(v)?,
            Value::Binary(v) => sink.write_binary(v)?,
            Value::Uuid(_) | Value::Timestamp(_) => {
                let ty = value.runtime_descriptor();
                match builtin_encoder(&ty) {
                    Some(encoder) => encoder.encode(value, sink, ctx)?,
                    None => return Err(ErrorKind::NoCodecFound { ty }.into()),
                }
            }
            Value::List(items) => {
                sink.write_start_array()?;
                for (index, item) in items.iter().enumerate() {
                    self.write(item, sink, ctx).map_err(|err| err.with_index(index))?;
                }
                sink.write_end_array()?;
            }
            Value::Map(entries) => {
                write_entries(entries, &self.key, sink, ctx, |value, sink| {
                    self.write(value, sink, ctx)
                })?;
            }
            Value::Enum(_) | Value::Object(_) => {
                let encoder = ctx.provider().resolve_encoder(&value.runtime_descriptor())?;
                encoder.encode(value, sink, ctx)?;
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use vc_token::json;

    use super::*;
    use crate::introspect::ClassRegistry;
    use crate::provider::Provider;

    #[test]
    fn natural_mapping_round_trip() {
        let provider = Provider::new(ClassRegistry::new());
        let input = r#"{"name":"box","size":[1,2.5],"open":false,"lid":null}"#;

        let mut stream = json::parse_started(input).unwrap();
        let value = UntypedDecoder::new()
            .decode(&mut stream, &DecodeContext::new(&provider))
            .unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("box"));
        assert_eq!(value.get("size").and_then(Value::as_list).map(<[Value]>::len), Some(2));

        let mut writer = json::JsonWriter::new();
        UntypedEncoder::new()
            .encode(&value, &mut writer, &EncodeContext::new(&provider))
            .unwrap();
        assert_eq!(writer.into_string().unwrap(), input);
    }

    #[test]
    fn unregistered_objects_fail_to_encode() {
        #[derive(Clone, Debug)]
        struct Opaque;

        let provider = Provider::new(ClassRegistry::new());
        let value = Value::List(alloc::vec![Value::Object(crate::value::Object::with_descriptor(
            TypeDescriptor::bean("Opaque"),
            Opaque,
        ))]);
        let err = UntypedEncoder::new()
            .encode(&value, &mut vc_token::TokenBuffer::new(), &EncodeContext::new(&provider))
            .unwrap_err();
        assert_eq!(err.path_string(), "$[0]");
    }
}
