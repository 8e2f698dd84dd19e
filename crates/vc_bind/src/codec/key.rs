use alloc::format;
use alloc::string::{String, ToString};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;
use vc_token::{Token, TokenBuffer, TokenSink, TokenStream};

use crate::codec::{DecodeContext, Decoder, EncodeContext, LinkedCodec};
use crate::config::EncodeFeatures;
use crate::error::{BindError, ErrorKind};
use crate::provider::Provider;
use crate::types::{ScalarKind, TypeDescriptor, TypeKind};
use crate::value::Value;

// -----------------------------------------------------------------------------
// KeyDecoder

/// Turns a field name into a map key of the declared key type.
#[derive(Debug)]
pub enum KeyDecoder {
    Text,
    Integer(ScalarKind),
    Float,
    Bool,
    Uuid,
    /// Feeds the name to a full decoder as a single string token.
    Delegate(LinkedCodec<dyn Decoder>),
}

impl KeyDecoder {
    /// The key decoder for `key`, the key type of `map`.
    pub fn for_type(map: &TypeDescriptor, key: &TypeDescriptor) -> Result<Self, BindError> {
        Ok(match key.kind() {
            TypeKind::Any | TypeKind::Scalar(ScalarKind::String | ScalarKind::Char) => Self::Text,
            TypeKind::Scalar(ScalarKind::Bool) => Self::Bool,
            TypeKind::Scalar(ScalarKind::Uuid) => Self::Uuid,
            TypeKind::Scalar(kind) if kind.is_integral() => Self::Integer(kind),
            TypeKind::Scalar(kind) if kind.is_floating() => Self::Float,
            TypeKind::Scalar(_) | TypeKind::Enum | TypeKind::Bean | TypeKind::Abstract => {
                Self::Delegate(LinkedCodec::new(key.clone()))
            }
            _ => {
                return Err(BindError::invalid_definition(
                    map,
                    format!("`{key}` cannot be used as a map key"),
                ));
            }
        })
    }

    #[inline]
    pub fn link(&self, provider: &Provider) -> Result<(), BindError> {
        match self {
            Self::Delegate(codec) => codec.link(provider),
            _ => Ok(()),
        }
    }

    pub fn decode(&self, key: &str, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        let fail = |kind: ScalarKind, err: &dyn core::fmt::Display| {
            BindError::conversion(&TypeDescriptor::scalar(kind), format!("key {key:?}: {err}"))
        };
        match self {
            Self::Text => Ok(Value::text(key)),
            Self::Integer(kind) => {
                let value = key.trim().parse::<i64>().map_err(|err| fail(*kind, &err))?;
                match kind.int_range() {
                    Some((min, max)) if value < min || value > max => {
                        Err(fail(*kind, &"out of range"))
                    }
                    _ => Ok(Value::Int(value)),
                }
            }
            Self::Float => key
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|err| fail(ScalarKind::F64, &err)),
            Self::Bool => match key {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail(ScalarKind::Bool, &"not a boolean")),
            },
            Self::Uuid => Uuid::parse_str(key)
                .map(Value::Uuid)
                .map_err(|err| fail(ScalarKind::Uuid, &err)),
            Self::Delegate(codec) => {
                let decoder = codec.get(ctx.provider())?;
                let mut buffer = TokenBuffer::new();
                buffer.write_string(key)?;
                let mut stream = buffer.into_stream();
                stream.expect_next()?;
                decoder.decode(&mut stream, ctx)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// KeyEncoder

/// Renders map keys as field names.
///
/// `null` keys go through the module's null-key encoder, and fail with
/// [`ErrorKind::NullKey`] when there is none.
#[derive(Debug, Clone)]
pub struct KeyEncoder {
    map: TypeDescriptor,
}

impl KeyEncoder {
    #[inline]
    pub fn new(map: TypeDescriptor) -> Self {
        Self { map }
    }

    pub fn encode(&self, key: &Value, ctx: &EncodeContext<'_>) -> Result<String, BindError> {
        Ok(match key {
            Value::Text(text) => text.clone(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Uuid(value) => value.to_string(),
            Value::Timestamp(value) => value.to_rfc3339(),
            Value::Binary(bytes) => STANDARD.encode(bytes),
            Value::Enum(value) => {
                if ctx.is_enabled(EncodeFeatures::WRITE_ENUMS_USING_INDEX) {
                    value.index().to_string()
                } else {
                    String::from(value.name())
                }
            }
            Value::Null => return self.encode_null(ctx),
            Value::List(_) | Value::Map(_) | Value::Object(_) => {
                return Err(BindError::conversion(
                    &key.runtime_descriptor(),
                    format!("a {} value cannot be a key of `{}`", key.variant_name(), self.map),
                ));
            }
        })
    }

    fn encode_null(&self, ctx: &EncodeContext<'_>) -> Result<String, BindError> {
        let Some(encoder) = ctx.provider().module().null_key_encoder() else {
            return Err(ErrorKind::NullKey { ty: self.map.clone() }.into());
        };
        let mut buffer = TokenBuffer::new();
        encoder.encode(&Value::Null, &mut buffer, ctx)?;
        match buffer.tokens() {
            [Token::String(name) | Token::FieldName(name)] => Ok(name.clone()),
            [Token::Int(value)] => Ok(value.to_string()),
            _ => Err(BindError::custom(format!(
                "the null key encoder of `{}` must write a single string",
                self.map
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BindConfig;
    use crate::introspect::ClassRegistry;

    fn map_of(key: TypeDescriptor) -> TypeDescriptor {
        TypeDescriptor::map(key, TypeDescriptor::any())
    }

    #[test]
    fn scalar_keys() {
        let provider = Provider::new(ClassRegistry::new());
        let ctx = DecodeContext::new(&provider);

        let key = TypeDescriptor::scalar(ScalarKind::U8);
        let decoder = KeyDecoder::for_type(&map_of(key.clone()), &key).unwrap();
        assert!(matches!(decoder.decode("7", &ctx), Ok(Value::Int(7))));
        assert!(decoder.decode("300", &ctx).is_err());
        assert!(decoder.decode("x", &ctx).is_err());

        let key = TypeDescriptor::scalar(ScalarKind::Bool);
        let decoder = KeyDecoder::for_type(&map_of(key.clone()), &key).unwrap();
        assert!(matches!(decoder.decode("true", &ctx), Ok(Value::Bool(true))));
    }

    #[test]
    fn container_keys_are_rejected() {
        let key = TypeDescriptor::list(TypeDescriptor::any());
        let err = KeyDecoder::for_type(&map_of(key.clone()), &key).unwrap_err();
        assert!(err.is_definition_error());
    }

    #[test]
    fn null_keys_fail_by_default() {
        let provider = Provider::new(ClassRegistry::new());
        let ctx = EncodeContext::new(&provider);
        let map = map_of(TypeDescriptor::any());
        let err = KeyEncoder::new(map.clone()).encode(&Value::Null, &ctx).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NullKey { ty } if *ty == map));
    }

    #[test]
    fn enum_keys_follow_index_feature() {
        let enum_ty = TypeDescriptor::enumeration("Color");
        let key = Value::Enum(crate::value::EnumValue::new(enum_ty.clone(), 1, "Green"));
        let map = map_of(enum_ty);

        let by_name = Provider::new(ClassRegistry::new());
        assert_eq!(
            KeyEncoder::new(map.clone()).encode(&key, &EncodeContext::new(&by_name)).unwrap(),
            "Green"
        );

        let by_index = Provider::builder(ClassRegistry::new())
            .config(BindConfig::default().with_encode(EncodeFeatures::WRITE_ENUMS_USING_INDEX, true))
            .build();
        assert_eq!(
            KeyEncoder::new(map).encode(&key, &EncodeContext::new(&by_index)).unwrap(),
            "1"
        );
    }
}
