use alloc::format;
use alloc::string::{String, ToString};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use vc_token::{Token, TokenKind, TokenSink, TokenStream};

use crate::codec::{CodecKind, DecodeContext, Decoder, EncodeContext, Encoder, decode_nullable};
use crate::config::{DecodeFeatures, EncodeFeatures};
use crate::error::BindError;
use crate::types::{ScalarKind, TypeDescriptor};
use crate::value::Value;

// -----------------------------------------------------------------------------
// ScalarDecoder

/// Decoder of one built-in [`ScalarKind`].
///
/// Coercions between token kinds are governed by [`DecodeFeatures`]:
///
/// - `ALLOW_COERCION_OF_SCALARS`: numeric and boolean text is parsed.
/// - `ACCEPT_FLOAT_AS_INT`: integral floats bind to integer kinds.
/// - `UNWRAP_SINGLE_VALUE_ARRAYS`: `[v]` binds like `v`.
///
/// Integer values are range-checked against the target kind.
#[derive(Debug)]
pub struct ScalarDecoder {
    kind: ScalarKind,
    descriptor: TypeDescriptor,
}

impl ScalarDecoder {
    #[inline]
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            descriptor: TypeDescriptor::scalar(kind),
        }
    }

    #[inline]
    pub fn scalar_kind(&self) -> ScalarKind {
        self.kind
    }

    fn unexpected(&self, expected: &'static str, stream: &dyn TokenStream) -> BindError {
        BindError::unexpected_token(&self.descriptor, expected, stream.current_token())
    }

    fn check_range(&self, value: i64) -> Result<Value, BindError> {
        match self.kind.int_range() {
            Some((min, max)) if value < min || value > max => Err(BindError::conversion(
                &self.descriptor,
                format!("{value} is out of range [{min}, {max}]"),
            )),
            _ => Ok(Value::Int(value)),
        }
    }

    fn decode_int(&self, stream: &dyn TokenStream, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        match stream.current() {
            Some(Token::Int(value)) => self.check_range(*value),
            Some(Token::Float(value)) => {
                let value = *value;
                if !ctx.is_enabled(DecodeFeatures::ACCEPT_FLOAT_AS_INT) {
                    return Err(BindError::conversion(
                        &self.descriptor,
                        format!("float {value} where an integer is expected"),
                    ));
                }
                if value.fract() != 0.0 || !value.is_finite() {
                    return Err(BindError::conversion(
                        &self.descriptor,
                        format!("{value} has a fractional part"),
                    ));
                }
                // Saturating cast, the range check catches overflow.
                self.check_range(value as i64)
            }
            Some(Token::String(text)) if ctx.is_enabled(DecodeFeatures::ALLOW_COERCION_OF_SCALARS) => {
                let value = text.trim().parse::<i64>().map_err(|err| {
                    BindError::conversion(&self.descriptor, format!("{text:?}: {err}"))
                })?;
                self.check_range(value)
            }
            _ => Err(self.unexpected("integer", stream)),
        }
    }

    fn decode_float(&self, stream: &dyn TokenStream, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        let value = match stream.current() {
            Some(Token::Float(value)) => *value,
            Some(Token::Int(value)) => *value as f64,
            Some(Token::String(text)) if ctx.is_enabled(DecodeFeatures::ALLOW_COERCION_OF_SCALARS) => {
                text.trim().parse::<f64>().map_err(|err| {
                    BindError::conversion(&self.descriptor, format!("{text:?}: {err}"))
                })?
            }
            _ => return Err(self.unexpected("number", stream)),
        };
        if self.kind == ScalarKind::F32 && value.is_finite() && (value as f32).is_infinite() {
            return Err(BindError::conversion(
                &self.descriptor,
                format!("{value} overflows f32"),
            ));
        }
        Ok(Value::Float(value))
    }

    fn decode_bool(&self, stream: &dyn TokenStream, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        let coerce = ctx.is_enabled(DecodeFeatures::ALLOW_COERCION_OF_SCALARS);
        match stream.current() {
            Some(Token::Bool(value)) => Ok(Value::Bool(*value)),
            Some(Token::Int(value)) if coerce => Ok(Value::Bool(*value != 0)),
            Some(Token::String(text)) if coerce => match text.trim() {
                "true" | "True" | "TRUE" => Ok(Value::Bool(true)),
                "false" | "False" | "FALSE" => Ok(Value::Bool(false)),
                _ => Err(BindError::conversion(
                    &self.descriptor,
                    format!("{text:?} is not a boolean"),
                )),
            },
            _ => Err(self.unexpected("boolean", stream)),
        }
    }

    fn decode_char(&self, stream: &dyn TokenStream) -> Result<Value, BindError> {
        match stream.current() {
            Some(Token::String(text)) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Text(c.to_string())),
                    _ => Err(BindError::conversion(
                        &self.descriptor,
                        format!("{text:?} is not a single character"),
                    )),
                }
            }
            Some(Token::Int(code)) => u32::try_from(*code)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Value::Text(c.to_string()))
                .ok_or_else(|| {
                    BindError::conversion(&self.descriptor, format!("{code} is not a character code"))
                }),
            _ => Err(self.unexpected("character", stream)),
        }
    }

    fn decode_string(&self, stream: &dyn TokenStream) -> Result<Value, BindError> {
        match stream.current() {
            Some(Token::String(text)) => Ok(Value::Text(text.clone())),
            Some(Token::Int(value)) => Ok(Value::Text(value.to_string())),
            Some(Token::Float(value)) => Ok(Value::Text(value.to_string())),
            Some(Token::Bool(value)) => Ok(Value::Text(value.to_string())),
            Some(Token::Embedded(bytes)) => Ok(Value::Text(STANDARD.encode(bytes))),
            _ => Err(self.unexpected("string", stream)),
        }
    }

    fn decode_bytes(&self, stream: &dyn TokenStream) -> Result<Value, BindError> {
        match stream.current() {
            Some(Token::Embedded(bytes)) => Ok(Value::Binary(bytes.clone())),
            Some(Token::String(text)) => STANDARD
                .decode(text)
                .map(Value::Binary)
                .map_err(|err| BindError::conversion(&self.descriptor, format!("invalid base64: {err}"))),
            _ => Err(self.unexpected("binary", stream)),
        }
    }

    fn decode_uuid(&self, stream: &dyn TokenStream) -> Result<Value, BindError> {
        match stream.current() {
            Some(Token::String(text)) => Uuid::parse_str(text.trim())
                .map(Value::Uuid)
                .map_err(|err| BindError::conversion(&self.descriptor, format!("{text:?}: {err}"))),
            Some(Token::Embedded(bytes)) => Uuid::from_slice(bytes)
                .map(Value::Uuid)
                .map_err(|err| BindError::conversion(&self.descriptor, err)),
            _ => Err(self.unexpected("uuid", stream)),
        }
    }

    fn decode_timestamp(&self, stream: &dyn TokenStream) -> Result<Value, BindError> {
        let out_of_range =
            |millis: i64| BindError::conversion(&self.descriptor, format!("{millis} ms is out of range"));
        match stream.current() {
            Some(Token::Int(millis)) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .map(Value::Timestamp)
                .ok_or_else(|| out_of_range(*millis)),
            Some(Token::Float(millis)) => {
                let whole = *millis as i64;
                DateTime::<Utc>::from_timestamp_millis(whole)
                    .map(Value::Timestamp)
                    .ok_or_else(|| out_of_range(whole))
            }
            Some(Token::String(text)) => DateTime::parse_from_rfc3339(text.trim())
                .map(|time| Value::Timestamp(time.with_timezone(&Utc)))
                .map_err(|err| BindError::conversion(&self.descriptor, format!("{text:?}: {err}"))),
            _ => Err(self.unexpected("timestamp", stream)),
        }
    }

    fn unwrap_array(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        if stream.expect_next()? == TokenKind::EndArray {
            return Err(self.unexpected("a single-value array", stream));
        }
        let value = decode_nullable(self, stream, ctx)?;
        if stream.expect_next()? != TokenKind::EndArray {
            return Err(self.unexpected("end of a single-value array", stream));
        }
        Ok(value)
    }

    fn zero(&self) -> Value {
        match self.kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::F32 | ScalarKind::F64 => Value::Float(0.0),
            ScalarKind::Char => Value::Text(String::from("\0")),
            _ => Value::Int(0),
        }
    }
}

impl Decoder for ScalarDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Scalar
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        if stream.current_token() == Some(TokenKind::StartArray)
            && ctx.is_enabled(DecodeFeatures::UNWRAP_SINGLE_VALUE_ARRAYS)
        {
            return self.unwrap_array(stream, ctx);
        }
        match self.kind {
            ScalarKind::Bool => self.decode_bool(stream, ctx),
            ScalarKind::F32 | ScalarKind::F64 => self.decode_float(stream, ctx),
            ScalarKind::Char => self.decode_char(stream),
            ScalarKind::String => self.decode_string(stream),
            ScalarKind::Bytes => self.decode_bytes(stream),
            ScalarKind::Uuid => self.decode_uuid(stream),
            ScalarKind::Timestamp => self.decode_timestamp(stream),
            _ => self.decode_int(stream, ctx),
        }
    }

    /// Zero for primitives, unless `FAIL_ON_NULL_FOR_PRIMITIVES` is set.
    fn null_value(&self, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        if !self.kind.is_primitive() {
            return Ok(Value::Null);
        }
        if ctx.is_enabled(DecodeFeatures::FAIL_ON_NULL_FOR_PRIMITIVES) {
            return Err(BindError::conversion(
                &self.descriptor,
                "null for a primitive type",
            ));
        }
        Ok(self.zero())
    }
}

// -----------------------------------------------------------------------------
// ScalarEncoder

/// Encoder of one built-in [`ScalarKind`].
#[derive(Debug)]
pub struct ScalarEncoder {
    kind: ScalarKind,
    descriptor: TypeDescriptor,
}

impl ScalarEncoder {
    #[inline]
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            descriptor: TypeDescriptor::scalar(kind),
        }
    }

    fn mismatch(&self, value: &Value) -> BindError {
        BindError::conversion(
            &self.descriptor,
            format!("cannot write a {} value", value.variant_name()),
        )
    }
}

impl Encoder for ScalarEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Scalar
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        match (self.kind, value) {
            (ScalarKind::Bool, Value::Bool(v)) => sink.write_bool(*v)?,
            (kind, Value::Int(v)) if kind.is_integral() => sink.write_int(*v)?,
            (kind, Value::Int(v)) if kind.is_floating() => sink.write_float(*v as f64)?,
            (kind, Value::Float(v)) if kind.is_floating() => sink.write_float(*v)?,
            (ScalarKind::Char | ScalarKind::String, Value::Text(v)) => sink.write_string(v)?,
            (ScalarKind::Bytes, Value::Binary(v)) => sink.write_binary(v)?,
            (ScalarKind::Uuid, Value::Uuid(v)) => {
                sink.write_string(v.hyphenated().encode_lower(&mut Uuid::encode_buffer()))?;
            }
            (ScalarKind::Timestamp, Value::Timestamp(v)) => {
                if ctx.is_enabled(EncodeFeatures::WRITE_DATES_AS_TIMESTAMPS) {
                    sink.write_int(v.timestamp_millis())?;
                } else {
                    sink.write_string(&v.to_rfc3339())?;
                }
            }
            _ => return Err(self.mismatch(value)),
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use vc_token::{TokenBuffer, json};

    use super::*;
    use crate::config::BindConfig;
    use crate::error::ErrorKind;
    use crate::introspect::ClassRegistry;
    use crate::provider::Provider;

    fn provider(config: BindConfig) -> Provider {
        Provider::builder(ClassRegistry::new()).config(config).build()
    }

    fn decode(kind: ScalarKind, input: &str, provider: &Provider) -> Result<Value, BindError> {
        let mut stream = json::parse_started(input).unwrap();
        decode_nullable(&ScalarDecoder::new(kind), &mut stream, &DecodeContext::new(provider))
    }

    #[test]
    fn integers_are_range_checked() {
        let provider = provider(BindConfig::default());
        assert!(matches!(decode(ScalarKind::U8, "255", &provider), Ok(Value::Int(255))));
        let err = decode(ScalarKind::U8, "256", &provider).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueConversionFailure { .. }));
        assert!(decode(ScalarKind::I8, "-129", &provider).is_err());
    }

    #[test]
    fn coercions_follow_features() {
        let lenient = provider(BindConfig::default());
        assert!(matches!(decode(ScalarKind::I32, "\" 42 \"", &lenient), Ok(Value::Int(42))));
        assert!(matches!(decode(ScalarKind::I64, "3.0", &lenient), Ok(Value::Int(3))));
        assert!(decode(ScalarKind::I64, "3.5", &lenient).is_err());

        let strict = provider(
            BindConfig::default()
                .with_decode(DecodeFeatures::ALLOW_COERCION_OF_SCALARS, false)
                .with_decode(DecodeFeatures::ACCEPT_FLOAT_AS_INT, false),
        );
        let err = decode(ScalarKind::I32, "\"42\"", &strict).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedToken { .. }));
        assert!(decode(ScalarKind::I64, "3.0", &strict).is_err());
    }

    #[test]
    fn null_for_primitives() {
        let lenient = provider(BindConfig::default());
        assert!(matches!(decode(ScalarKind::I32, "null", &lenient), Ok(Value::Int(0))));
        assert!(matches!(decode(ScalarKind::Bool, "null", &lenient), Ok(Value::Bool(false))));
        assert!(matches!(decode(ScalarKind::String, "null", &lenient), Ok(Value::Null)));

        let strict = provider(
            BindConfig::default().with_decode(DecodeFeatures::FAIL_ON_NULL_FOR_PRIMITIVES, true),
        );
        assert!(decode(ScalarKind::I32, "null", &strict).is_err());
        assert!(matches!(decode(ScalarKind::Uuid, "null", &strict), Ok(Value::Null)));
    }

    #[test]
    fn single_value_arrays() {
        let unwrap = provider(
            BindConfig::default().with_decode(DecodeFeatures::UNWRAP_SINGLE_VALUE_ARRAYS, true),
        );
        assert!(matches!(decode(ScalarKind::I32, "[7]", &unwrap), Ok(Value::Int(7))));
        assert!(decode(ScalarKind::I32, "[7, 8]", &unwrap).is_err());
        assert!(decode(ScalarKind::I32, "[7]", &provider(BindConfig::default())).is_err());
    }

    #[test]
    fn bytes_uuid_and_timestamps() {
        let provider = provider(BindConfig::default());
        match decode(ScalarKind::Bytes, "\"AQID\"", &provider) {
            Ok(Value::Binary(bytes)) => assert_eq!(bytes, [1, 2, 3]),
            other => panic!("unexpected {other:?}"),
        }
        assert!(decode(ScalarKind::Bytes, "\"@@\"", &provider).is_err());

        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        match decode(ScalarKind::Uuid, &format!("\"{id}\""), &provider) {
            Ok(Value::Uuid(uuid)) => assert_eq!(uuid.to_string(), id),
            other => panic!("unexpected {other:?}"),
        }

        let from_millis = decode(ScalarKind::Timestamp, "1700000000000", &provider).unwrap();
        let from_text = decode(ScalarKind::Timestamp, "\"2023-11-14T22:13:20Z\"", &provider).unwrap();
        match (from_millis, from_text) {
            (Value::Timestamp(a), Value::Timestamp(b)) => assert_eq!(a, b),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn timestamps_encode_per_feature() {
        let time = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap();
        let encoder = ScalarEncoder::new(ScalarKind::Timestamp);

        let millis = provider(BindConfig::default());
        let mut buffer = TokenBuffer::new();
        encoder
            .encode(&Value::Timestamp(time), &mut buffer, &EncodeContext::new(&millis))
            .unwrap();
        assert_eq!(buffer.tokens(), [Token::Int(1_700_000_000_000)]);

        let text = provider(
            BindConfig::default().with_encode(EncodeFeatures::WRITE_DATES_AS_TIMESTAMPS, false),
        );
        let mut buffer = TokenBuffer::new();
        encoder
            .encode(&Value::Timestamp(time), &mut buffer, &EncodeContext::new(&text))
            .unwrap();
        let tokens: Vec<Token> = buffer.into_tokens();
        assert_eq!(tokens, [Token::String(time.to_rfc3339())]);
    }

    #[test]
    fn encoder_rejects_foreign_values() {
        let provider = provider(BindConfig::default());
        let err = ScalarEncoder::new(ScalarKind::Bool)
            .encode(&Value::text("yes"), &mut TokenBuffer::new(), &EncodeContext::new(&provider))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueConversionFailure { .. }));
    }
}
