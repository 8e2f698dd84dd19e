use alloc::string::String;

use vc_token::{ChainedStream, StreamError, Token, TokenBuffer, TokenKind, TokenSink, TokenStream};

use crate::codec::{CodecKind, DecodeContext, Decoder, decode_nullable};
use crate::error::{BindError, ErrorKind};
use crate::introspect::TypeIdStyle;
use crate::poly::TypeIdResolver;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// Placeholder decoder of an abstract type.
///
/// Native scalars (text, numbers, booleans) carry no type id and pass
/// through as their natural value. Everything else must carry an id in the
/// resolver's [`TypeIdStyle`]; the value is then decoded by the decoder of
/// the concrete type, resolved through the provider.
///
/// Objects under [`TypeIdStyle::Property`] may place the id anywhere: the
/// fields before it are buffered and replayed in front of the rest of the
/// object. Under the same style a wrapper array is accepted too, since that
/// is how non-object values are written.
///
/// Input without an id decodes as the default implementation, if any, and
/// fails with [`ErrorKind::AbstractTypeNotInstantiable`] otherwise.
#[derive(Debug)]
pub struct PolymorphicDecoder {
    resolver: TypeIdResolver,
}

impl PolymorphicDecoder {
    #[inline]
    pub fn new(resolver: TypeIdResolver) -> Self {
        Self { resolver }
    }

    #[inline]
    pub fn resolver(&self) -> &TypeIdResolver {
        &self.resolver
    }

    fn not_instantiable(&self) -> BindError {
        ErrorKind::AbstractTypeNotInstantiable {
            ty: self.resolver.declared().clone(),
        }
        .into()
    }

    fn concrete_type(&self, id: &str, ctx: &DecodeContext<'_>) -> Result<TypeDescriptor, BindError> {
        self.resolver.type_of(id, ctx.provider().introspector())
    }

    fn decode_concrete(
        &self,
        ty: &TypeDescriptor,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let decoder = ctx.provider().resolve_decoder(ty)?;
        decode_nullable(&*decoder, stream, ctx)
    }

    /// Decodes a value that turned out to carry no id.
    ///
    /// `head` holds the tokens already consumed, up to and including the
    /// current token of `stream`.
    fn decode_untagged(
        &self,
        head: TokenBuffer,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let Some(ty) = self.resolver.default_impl() else {
            return Err(self.not_instantiable());
        };
        let mut chained = ChainedStream::new(head, stream)?;
        self.decode_concrete(ty, &mut chained, ctx)
    }

    fn decode_with_property(
        &self,
        property: &str,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let mut buffered = TokenBuffer::new();
        buffered.write_start_object()?;
        loop {
            match stream.expect_next()? {
                TokenKind::EndObject => break,
                TokenKind::FieldName => {}
                found => {
                    return Err(BindError::unexpected_token(
                        self.resolver.declared(),
                        "field name",
                        Some(found),
                    ));
                }
            }
            if stream.text()? == property {
                stream.expect_next()?;
                let Some(Token::String(id)) = stream.current() else {
                    return Err(BindError::unexpected_token(
                        self.resolver.declared(),
                        "type id",
                        stream.current_token(),
                    ));
                };
                let ty = self.concrete_type(id, ctx)?;
                // Resumes after the id, with the earlier fields replayed first.
                let mut chained = ChainedStream::new(buffered, &mut *stream)?;
                return self.decode_concrete(&ty, &mut chained, ctx);
            }
            buffered.write_field_name(stream.text()?)?;
            stream.expect_next()?;
            buffered.copy_current_structure(&mut *stream)?;
        }
        buffered.write_end_object()?;
        self.decode_untagged(buffered, &mut TokenBuffer::new().into_stream(), ctx)
    }

    fn decode_wrapper_array(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        stream.expect_next()?;
        let id = match stream.current() {
            Some(Token::String(id)) => id.clone(),
            Some(token) => {
                let token = token.clone();
                let mut head = TokenBuffer::new();
                head.write_start_array()?;
                head.write_token(&token)?;
                return self.decode_untagged(head, stream, ctx);
            }
            None => return Err(StreamError::UnexpectedEof.into()),
        };
        let ty = self.concrete_type(&id, ctx)?;
        stream.expect_next()?;
        let value = self.decode_concrete(&ty, stream, ctx)?;
        match stream.expect_next()? {
            TokenKind::EndArray => Ok(value),
            found => Err(BindError::unexpected_token(
                self.resolver.declared(),
                "end of type id wrapper",
                Some(found),
            )),
        }
    }

    fn decode_wrapper_object(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let id: String = match stream.expect_next()? {
            TokenKind::FieldName => stream.text_owned()?,
            TokenKind::EndObject => {
                let mut head = TokenBuffer::new();
                head.write_start_object()?;
                head.write_end_object()?;
                return self.decode_untagged(head, &mut TokenBuffer::new().into_stream(), ctx);
            }
            found => {
                return Err(BindError::unexpected_token(
                    self.resolver.declared(),
                    "type id",
                    Some(found),
                ));
            }
        };
        let ty = self.concrete_type(&id, ctx)?;
        stream.expect_next()?;
        let value = self.decode_concrete(&ty, stream, ctx)?;
        match stream.expect_next()? {
            TokenKind::EndObject => Ok(value),
            found => Err(BindError::unexpected_token(
                self.resolver.declared(),
                "end of type id wrapper",
                Some(found),
            )),
        }
    }
}

impl Decoder for PolymorphicDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        self.resolver.declared()
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Placeholder
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let style = self.resolver.style();
        match stream.current() {
            Some(Token::String(text)) => Ok(Value::Text(text.clone())),
            Some(Token::Int(value)) => Ok(Value::Int(*value)),
            Some(Token::Float(value)) => Ok(Value::Float(*value)),
            Some(Token::Bool(value)) => Ok(Value::Bool(*value)),
            Some(Token::Null) => Ok(Value::Null),
            Some(Token::Embedded(bytes)) => Ok(Value::Binary(bytes.clone())),
            Some(Token::StartObject) => match style {
                TypeIdStyle::Property(property) => {
                    self.decode_with_property(property, stream, ctx)
                }
                TypeIdStyle::WrapperObject => self.decode_wrapper_object(stream, ctx),
                TypeIdStyle::WrapperArray => {
                    let mut head = TokenBuffer::new();
                    head.write_start_object()?;
                    self.decode_untagged(head, stream, ctx)
                }
            },
            Some(Token::StartArray) => match style {
                TypeIdStyle::Property(_) | TypeIdStyle::WrapperArray => {
                    self.decode_wrapper_array(stream, ctx)
                }
                TypeIdStyle::WrapperObject => {
                    let mut head = TokenBuffer::new();
                    head.write_start_array()?;
                    self.decode_untagged(head, stream, ctx)
                }
            },
            Some(Token::EndObject | Token::EndArray | Token::FieldName(_)) | None => {
                Err(BindError::unexpected_token(
                    self.resolver.declared(),
                    "a value",
                    stream.current_token(),
                ))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
