use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;

use vc_token::{Token, TokenSink, TokenStream};

use crate::codec::{CodecKind, DecodeContext, Decoder, EncodeContext, Encoder};
use crate::config::{DecodeFeatures, EncodeFeatures};
use crate::error::BindError;
use crate::introspect::EnumModel;
use crate::types::TypeDescriptor;
use crate::value::{EnumValue, Value};

// -----------------------------------------------------------------------------
// EnumDecoder

/// Decodes enum constants by name, or by ordinal.
#[derive(Debug)]
pub struct EnumDecoder {
    model: Arc<EnumModel>,
}

impl EnumDecoder {
    #[inline]
    pub fn new(model: Arc<EnumModel>) -> Self {
        Self { model }
    }

    fn constant(&self, index: usize) -> Option<Value> {
        let name = self.model.name(index)?;
        Some(Value::Enum(EnumValue::new(
            self.model.descriptor().clone(),
            index,
            name,
        )))
    }

    fn unknown(&self, what: String, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        if ctx.is_enabled(DecodeFeatures::READ_UNKNOWN_ENUM_VALUES_AS_NULL) {
            return Ok(Value::Null);
        }
        Err(BindError::conversion(
            self.model.descriptor(),
            format!(
                "{what} is not one of [{}]",
                self.model.variants().join(", ")
            ),
        ))
    }
}

impl Decoder for EnumDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        self.model.descriptor()
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Enum
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        match stream.current() {
            Some(Token::String(name)) => {
                let ignore_case = ctx.is_enabled(DecodeFeatures::ACCEPT_CASE_INSENSITIVE_ENUMS);
                match self.model.index_of(name, ignore_case).and_then(|i| self.constant(i)) {
                    Some(value) => Ok(value),
                    None => self.unknown(format!("{name:?}"), ctx),
                }
            }
            Some(Token::Int(index)) => {
                if ctx.is_enabled(DecodeFeatures::FAIL_ON_NUMBERS_FOR_ENUMS) {
                    return Err(BindError::conversion(
                        self.model.descriptor(),
                        format!("ordinal {index} where a name is expected"),
                    ));
                }
                match usize::try_from(*index).ok().and_then(|i| self.constant(i)) {
                    Some(value) => Ok(value),
                    None => self.unknown(format!("ordinal {index}"), ctx),
                }
            }
            _ => Err(BindError::unexpected_token(
                self.model.descriptor(),
                "enum name",
                stream.current_token(),
            )),
        }
    }
}

// -----------------------------------------------------------------------------
// EnumEncoder

/// Writes enum constants as their name, or with `WRITE_ENUMS_USING_INDEX`
/// as their ordinal.
#[derive(Debug)]
pub struct EnumEncoder {
    model: Arc<EnumModel>,
}

impl EnumEncoder {
    #[inline]
    pub fn new(model: Arc<EnumModel>) -> Self {
        Self { model }
    }
}

impl Encoder for EnumEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        self.model.descriptor()
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Enum
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let Value::Enum(constant) = value else {
            return Err(BindError::conversion(
                self.model.descriptor(),
                format!("cannot write a {} value", value.variant_name()),
            ));
        };
        if ctx.is_enabled(EncodeFeatures::WRITE_ENUMS_USING_INDEX) {
            sink.write_int(constant.index() as i64)?;
        } else {
            sink.write_string(constant.name())?;
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
    use crate::config::BindConfig;
    use crate::introspect::ClassRegistry;
    use crate::provider::Provider;

    fn model() -> Arc<EnumModel> {
        Arc::new(EnumModel::new(
            TypeDescriptor::enumeration("Color"),
            ["Red", "Green", "Blue"],
        ))
    }

    fn decode(config: BindConfig, input: &str) -> Result<Value, BindError> {
        let provider = Provider::builder(ClassRegistry::new()).config(config).build();
        let mut stream = json::parse_started(input).unwrap();
        EnumDecoder::new(model()).decode(&mut stream, &DecodeContext::new(&provider))
    }

    #[test]
    fn by_name_and_ordinal() {
        let value = decode(BindConfig::default(), "\"Green\"").unwrap();
        assert_eq!(value.as_enum().unwrap().index(), 1);
        let value = decode(BindConfig::default(), "2").unwrap();
        assert_eq!(value.as_enum().unwrap().name(), "Blue");
        assert!(decode(BindConfig::default(), "3").is_err());
    }

    #[test]
    fn feature_switches() {
        assert!(decode(BindConfig::default(), "\"green\"").is_err());
        let value = decode(
            BindConfig::default().with_decode(DecodeFeatures::ACCEPT_CASE_INSENSITIVE_ENUMS, true),
            "\"green\"",
        )
        .unwrap();
        assert_eq!(value.as_enum().unwrap().name(), "Green");

        let value = decode(
            BindConfig::default().with_decode(DecodeFeatures::READ_UNKNOWN_ENUM_VALUES_AS_NULL, true),
            "\"Purple\"",
        )
        .unwrap();
        assert!(value.is_null());

        assert!(
            decode(
                BindConfig::default().with_decode(DecodeFeatures::FAIL_ON_NUMBERS_FOR_ENUMS, true),
                "0",
            )
            .is_err()
        );
    }
}
