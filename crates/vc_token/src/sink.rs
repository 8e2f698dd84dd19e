use crate::{StreamError, Token};

// -----------------------------------------------------------------------------
// TokenSink

/// A push-based writer of tokens.
///
/// Sinks validate structure as far as they can (a field name outside of
/// an object is an error), but they never buffer partial values on behalf
/// of the caller.
pub trait TokenSink {
    fn write_start_object(&mut self) -> Result<(), StreamError>;

    fn write_end_object(&mut self) -> Result<(), StreamError>;

    fn write_start_array(&mut self) -> Result<(), StreamError>;

    fn write_end_array(&mut self) -> Result<(), StreamError>;

    fn write_field_name(&mut self, name: &str) -> Result<(), StreamError>;

    fn write_string(&mut self, value: &str) -> Result<(), StreamError>;

    fn write_int(&mut self, value: i64) -> Result<(), StreamError>;

    fn write_float(&mut self, value: f64) -> Result<(), StreamError>;

    fn write_bool(&mut self, value: bool) -> Result<(), StreamError>;

    fn write_null(&mut self) -> Result<(), StreamError>;

    fn write_binary(&mut self, value: &[u8]) -> Result<(), StreamError>;

    /// Writes an already materialized token.
    fn write_token(&mut self, token: &Token) -> Result<(), StreamError> {
        match token {
            Token::StartObject => self.write_start_object(),
            Token::EndObject => self.write_end_object(),
            Token::StartArray => self.write_start_array(),
            Token::EndArray => self.write_end_array(),
            Token::FieldName(name) => self.write_field_name(name),
            Token::String(value) => self.write_string(value),
            Token::Int(value) => self.write_int(*value),
            Token::Float(value) => self.write_float(*value),
            Token::Bool(value) => self.write_bool(*value),
            Token::Null => self.write_null(),
            Token::Embedded(bytes) => self.write_binary(bytes),
        }
    }

    /// Flushes buffered output, if any.
    fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

impl<S: TokenSink + ?Sized> TokenSink for &mut S {
    #[inline]
    fn write_start_object(&mut self) -> Result<(), StreamError> {
        (**self).write_start_object()
    }

    #[inline]
    fn write_end_object(&mut self) -> Result<(), StreamError> {
        (**self).write_end_object()
    }

    #[inline]
    fn write_start_array(&mut self) -> Result<(), StreamError> {
        (**self).write_start_array()
    }

    #[inline]
    fn write_end_array(&mut self) -> Result<(), StreamError> {
        (**self).write_end_array()
    }

    #[inline]
    fn write_field_name(&mut self, name: &str) -> Result<(), StreamError> {
        (**self).write_field_name(name)
    }

    #[inline]
    fn write_string(&mut self, value: &str) -> Result<(), StreamError> {
        (**self).write_string(value)
    }

    #[inline]
    fn write_int(&mut self, value: i64) -> Result<(), StreamError> {
        (**self).write_int(value)
    }

    #[inline]
    fn write_float(&mut self, value: f64) -> Result<(), StreamError> {
        (**self).write_float(value)
    }

    #[inline]
    fn write_bool(&mut self, value: bool) -> Result<(), StreamError> {
        (**self).write_bool(value)
    }

    #[inline]
    fn write_null(&mut self) -> Result<(), StreamError> {
        (**self).write_null()
    }

    #[inline]
    fn write_binary(&mut self, value: &[u8]) -> Result<(), StreamError> {
        (**self).write_binary(value)
    }

    #[inline]
    fn flush(&mut self) -> Result<(), StreamError> {
        (**self).flush()
    }
}
