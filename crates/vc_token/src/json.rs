//! JSON adapter built on [`serde_json`].
//!
//! - [`parse`]: JSON text to a [`BufferStream`].
//! - [`JsonWriter`]: a [`TokenSink`] producing a [`serde_json::Value`].
//! - [`read_value`] / [`write_value`]: tree ⇄ tokens.
//! - [`serialize_into`] / [`deserialize_from`]: the serde bridge, binding any
//!   `Serialize`/`Deserialize` type through tokens.
//!
//! Binary tokens have no JSON form; [`JsonWriter`] writes them as standard
//! base64 text, which [`TokenStream::binary_value`] reads back.
//!
//! # Examples
//!
//! ```
//! use vc_token::{TokenSink, json::JsonWriter};
//!
//! let mut writer = JsonWriter::new();
//! writer.write_start_object().unwrap();
//! writer.write_field_name("id").unwrap();
//! writer.write_int(4).unwrap();
//! writer.write_end_object().unwrap();
//!
//! assert_eq!(writer.into_string().unwrap(), r#"{"id":4}"#);
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::{BufferStream, StreamError, Token, TokenBuffer, TokenKind, TokenSink, TokenStream};

// -----------------------------------------------------------------------------
// Reading

/// Parses JSON text into a stream positioned before its first token.
///
/// # Examples
///
/// ```
/// use vc_token::{TokenKind, TokenStream, json};
///
/// let mut stream = json::parse("[true, null]").unwrap();
/// assert_eq!(stream.next_token().unwrap(), Some(TokenKind::StartArray));
/// assert_eq!(stream.next_token().unwrap(), Some(TokenKind::ValueTrue));
/// assert_eq!(stream.next_token().unwrap(), Some(TokenKind::ValueNull));
/// ```
pub fn parse(input: &str) -> Result<BufferStream, StreamError> {
    let value: Value = serde_json::from_str(input)?;
    let mut buffer = TokenBuffer::new();
    write_value(&value, &mut buffer)?;
    Ok(buffer.into_stream())
}

/// Parses JSON text and advances to its first token.
///
/// This is the usual entry point for decoders, which expect to be
/// positioned on the first token of the value they read.
pub fn parse_started(input: &str) -> Result<BufferStream, StreamError> {
    let mut stream = parse(input)?;
    stream.expect_next()?;
    Ok(stream)
}

/// Reads the value starting at the current token into a JSON tree.
///
/// On return the stream is positioned on the last token of that value.
pub fn read_value<S: TokenStream + ?Sized>(stream: &mut S) -> Result<Value, StreamError> {
    let token = stream.current().cloned().ok_or(StreamError::NoCurrentToken)?;
    match token {
        Token::StartObject => {
            let mut map = Map::new();
            loop {
                match stream.expect_next()? {
                    TokenKind::EndObject => break,
                    TokenKind::FieldName => {
                        let name = stream.text_owned()?;
                        stream.expect_next()?;
                        map.insert(name, read_value(stream)?);
                    }
                    other => return Err(StreamError::mismatch("field name", other)),
                }
            }
            Ok(Value::Object(map))
        }
        Token::StartArray => {
            let mut items = Vec::new();
            loop {
                match stream.expect_next()? {
                    TokenKind::EndArray => break,
                    _ => items.push(read_value(stream)?),
                }
            }
            Ok(Value::Array(items))
        }
        Token::String(text) => Ok(Value::String(text)),
        Token::Int(v) => Ok(Value::Number(Number::from(v))),
        Token::Float(v) => Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| StreamError::NumberOutOfRange(alloc::format!("{v}"))),
        Token::Bool(v) => Ok(Value::Bool(v)),
        Token::Null => Ok(Value::Null),
        Token::Embedded(bytes) => Ok(Value::String(STANDARD.encode(bytes))),
        other => Err(StreamError::mismatch("value", other.kind())),
    }
}

// -----------------------------------------------------------------------------
// Writing

/// Writes a JSON tree as tokens.
pub fn write_value<W: TokenSink + ?Sized>(value: &Value, sink: &mut W) -> Result<(), StreamError> {
    match value {
        Value::Null => sink.write_null(),
        Value::Bool(v) => sink.write_bool(*v),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                sink.write_int(v)
            } else if let Some(v) = n.as_f64() {
                sink.write_float(v)
            } else {
                Err(StreamError::NumberOutOfRange(alloc::format!("{n}")))
            }
        }
        Value::String(s) => sink.write_string(s),
        Value::Array(items) => {
            sink.write_start_array()?;
            for item in items {
                write_value(item, sink)?;
            }
            sink.write_end_array()
        }
        Value::Object(map) => {
            sink.write_start_object()?;
            for (name, item) in map {
                sink.write_field_name(name)?;
                write_value(item, sink)?;
            }
            sink.write_end_object()
        }
    }
}

enum Frame {
    Array(Vec<Value>),
    Object(Map<String, Value>, Option<String>),
}

/// A [`TokenSink`] assembling a [`serde_json::Value`].
#[derive(Default)]
pub struct JsonWriter {
    stack: Vec<Frame>,
    root: Option<Value>,
}

impl JsonWriter {
    #[inline]
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            root: None,
        }
    }

    /// Returns the written tree.
    pub fn finish(self) -> Result<Value, StreamError> {
        if !self.stack.is_empty() {
            return Err(StreamError::Unbalanced("unclosed container"));
        }
        self.root.ok_or(StreamError::UnexpectedEof)
    }

    /// Returns the written tree as compact JSON text.
    pub fn into_string(self) -> Result<String, StreamError> {
        Ok(serde_json::to_string(&self.finish()?)?)
    }

    fn push_value(&mut self, value: Value) -> Result<(), StreamError> {
        match self.stack.last_mut() {
            None if self.root.is_none() => {
                self.root = Some(value);
                Ok(())
            }
            None => Err(StreamError::Unbalanced("more than one root value")),
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Frame::Object(map, pending)) => match pending.take() {
                Some(name) => {
                    map.insert(name, value);
                    Ok(())
                }
                None => Err(StreamError::Unbalanced("object value without field name")),
            },
        }
    }
}

impl TokenSink for JsonWriter {
    fn write_start_object(&mut self) -> Result<(), StreamError> {
        self.stack.push(Frame::Object(Map::new(), None));
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(Frame::Object(map, None)) => self.push_value(Value::Object(map)),
            Some(Frame::Object(_, Some(_))) => {
                Err(StreamError::Unbalanced("field name without value"))
            }
            _ => Err(StreamError::Unbalanced("object end without start")),
        }
    }

    fn write_start_array(&mut self) -> Result<(), StreamError> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), StreamError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.push_value(Value::Array(items)),
            _ => Err(StreamError::Unbalanced("array end without start")),
        }
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), StreamError> {
        match self.stack.last_mut() {
            Some(Frame::Object(_, pending @ None)) => {
                *pending = Some(String::from(name));
                Ok(())
            }
            _ => Err(StreamError::Unbalanced("field name outside of an object")),
        }
    }

    #[inline]
    fn write_string(&mut self, value: &str) -> Result<(), StreamError> {
        self.push_value(Value::String(String::from(value)))
    }

    #[inline]
    fn write_int(&mut self, value: i64) -> Result<(), StreamError> {
        self.push_value(Value::Number(Number::from(value)))
    }

    fn write_float(&mut self, value: f64) -> Result<(), StreamError> {
        let number = Number::from_f64(value)
            .ok_or_else(|| StreamError::NumberOutOfRange(alloc::format!("{value}")))?;
        self.push_value(Value::Number(number))
    }

    #[inline]
    fn write_bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.push_value(Value::Bool(value))
    }

    #[inline]
    fn write_null(&mut self) -> Result<(), StreamError> {
        self.push_value(Value::Null)
    }

    #[inline]
    fn write_binary(&mut self, value: &[u8]) -> Result<(), StreamError> {
        self.push_value(Value::String(STANDARD.encode(value)))
    }
}

// -----------------------------------------------------------------------------
// Serde bridge

/// Writes any serde-serializable value as tokens.
pub fn serialize_into<T, W>(value: &T, sink: &mut W) -> Result<(), StreamError>
where
    T: Serialize + ?Sized,
    W: TokenSink + ?Sized,
{
    let tree = serde_json::to_value(value)?;
    write_value(&tree, sink)
}

/// Reads a serde-deserializable value starting at the current token.
///
/// On return the stream is positioned on the last token of that value.
pub fn deserialize_from<T, S>(stream: &mut S) -> Result<T, StreamError>
where
    T: DeserializeOwned,
    S: TokenStream + ?Sized,
{
    let tree = read_value(stream)?;
    Ok(serde_json::from_value(tree)?)
}

/// Renders tokens as compact JSON text.
pub fn to_string(buffer: &TokenBuffer) -> Result<String, StreamError> {
    let mut stream = buffer.clone().into_stream();
    stream.expect_next()?;
    let tree = read_value(&mut stream)?;
    Ok(serde_json::to_string(&tree)?)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_field_order() {
        let text = r#"{"z":1,"a":[1.5,"x",null],"m":{"k":false}}"#;
        let mut stream = parse_started(text).unwrap();
        let tree = read_value(&mut stream).unwrap();
        assert_eq!(serde_json::to_string(&tree).unwrap(), text);
        assert_eq!(stream.next_token().unwrap(), None);
    }

    #[test]
    fn writer_rejects_value_without_name() {
        let mut writer = JsonWriter::new();
        writer.write_start_object().unwrap();
        assert!(writer.write_int(1).is_err());
    }

    #[test]
    fn binary_is_written_as_base64() {
        let mut writer = JsonWriter::new();
        writer.write_binary(&[1, 2, 3]).unwrap();
        let text = writer.into_string().unwrap();
        assert_eq!(text, r#""AQID""#);

        let stream = parse_started(&text).unwrap();
        assert_eq!(stream.binary_value().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let mut writer = JsonWriter::new();
        assert!(matches!(
            writer.write_float(f64::NAN),
            Err(StreamError::NumberOutOfRange(_))
        ));
    }
}
