use alloc::string::String;
use alloc::vec::Vec;

use crate::{StreamError, Token, TokenKind, TokenSink, TokenStream};

// -----------------------------------------------------------------------------
// TokenBuffer

/// An in-memory [`TokenSink`] whose content can be replayed as a stream.
///
/// Used to hold tokens that were read ahead of time, e.g. the fields that
/// precede a type id property in a polymorphic object.
///
/// # Examples
///
/// ```
/// use vc_token::{Token, TokenBuffer, TokenSink};
///
/// let mut buffer = TokenBuffer::new();
/// buffer.write_start_object().unwrap();
/// buffer.write_field_name("a").unwrap();
/// buffer.write_bool(true).unwrap();
/// buffer.write_end_object().unwrap();
///
/// assert_eq!(buffer.len(), 4);
/// assert_eq!(buffer.tokens()[1], Token::FieldName("a".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    // `true` for an open object, `false` for an open array.
    open: Vec<bool>,
}

impl TokenBuffer {
    /// Creates an empty buffer.
    #[inline]
    pub const fn new() -> Self {
        Self {
            tokens: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Number of buffered tokens.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns `true` when every opened container has been closed.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.open.is_empty()
    }

    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Turns the buffer into a stream positioned before its first token.
    #[inline]
    pub fn into_stream(self) -> BufferStream {
        BufferStream::new(self.tokens)
    }

    /// Appends the current token of `stream` and, for a container start,
    /// everything up to and including its matching end token.
    ///
    /// On return the stream is positioned on the last copied token.
    pub fn copy_current_structure<S: TokenStream + ?Sized>(
        &mut self,
        stream: &mut S,
    ) -> Result<(), StreamError> {
        let first = stream.current().cloned().ok_or(StreamError::NoCurrentToken)?;
        let nested = first.kind().is_struct_start();
        self.write_token(&first)?;
        if !nested {
            return Ok(());
        }

        let mut depth = 1usize;
        while depth > 0 {
            let kind = stream.expect_next()?;
            if kind.is_struct_start() {
                depth += 1;
            } else if kind.is_struct_end() {
                depth -= 1;
            }
            let token = stream.current().cloned().ok_or(StreamError::NoCurrentToken)?;
            self.write_token(&token)?;
        }
        Ok(())
    }

    fn close(&mut self, object: bool) -> Result<(), StreamError> {
        match self.open.pop() {
            Some(open) if open == object => Ok(()),
            Some(_) => Err(StreamError::Unbalanced("mismatched container end")),
            None => Err(StreamError::Unbalanced("container end without start")),
        }
    }
}

impl TokenSink for TokenBuffer {
    fn write_start_object(&mut self) -> Result<(), StreamError> {
        self.open.push(true);
        self.tokens.push(Token::StartObject);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), StreamError> {
        self.close(true)?;
        self.tokens.push(Token::EndObject);
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<(), StreamError> {
        self.open.push(false);
        self.tokens.push(Token::StartArray);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), StreamError> {
        self.close(false)?;
        self.tokens.push(Token::EndArray);
        Ok(())
    }

    fn write_field_name(&mut self, name: &str) -> Result<(), StreamError> {
        if self.open.last() != Some(&true) {
            return Err(StreamError::Unbalanced("field name outside of an object"));
        }
        self.tokens.push(Token::FieldName(String::from(name)));
        Ok(())
    }

    #[inline]
    fn write_string(&mut self, value: &str) -> Result<(), StreamError> {
        self.tokens.push(Token::String(String::from(value)));
        Ok(())
    }

    #[inline]
    fn write_int(&mut self, value: i64) -> Result<(), StreamError> {
        self.tokens.push(Token::Int(value));
        Ok(())
    }

    #[inline]
    fn write_float(&mut self, value: f64) -> Result<(), StreamError> {
        self.tokens.push(Token::Float(value));
        Ok(())
    }

    #[inline]
    fn write_bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.tokens.push(Token::Bool(value));
        Ok(())
    }

    #[inline]
    fn write_null(&mut self) -> Result<(), StreamError> {
        self.tokens.push(Token::Null);
        Ok(())
    }

    #[inline]
    fn write_binary(&mut self, value: &[u8]) -> Result<(), StreamError> {
        self.tokens.push(Token::Embedded(value.to_vec()));
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// BufferStream

/// A [`TokenStream`] over an owned token list.
#[derive(Debug, Clone)]
pub struct BufferStream {
    tokens: Vec<Token>,
    // `None` before the first `next_token`.
    cursor: Option<usize>,
}

impl BufferStream {
    /// Creates a stream positioned before the first token.
    #[inline]
    pub const fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: None,
        }
    }

    /// Tokens not yet consumed, excluding the current one.
    #[inline]
    pub fn remaining(&self) -> &[Token] {
        let start = self.cursor.map_or(0, |c| c + 1);
        self.tokens.get(start..).unwrap_or(&[])
    }
}

impl TokenStream for BufferStream {
    fn next_token(&mut self) -> Result<Option<TokenKind>, StreamError> {
        let next = self.cursor.map_or(0, |c| c + 1);
        // Park one past the end so `current` reports nothing.
        self.cursor = Some(next.min(self.tokens.len()));
        Ok(self.tokens.get(next).map(Token::kind))
    }

    #[inline]
    fn current(&self) -> Option<&Token> {
        self.cursor.and_then(|c| self.tokens.get(c))
    }

    fn current_name(&self) -> Option<&str> {
        let cursor = self.cursor?;
        match self.tokens.get(cursor)? {
            Token::FieldName(name) => Some(name),
            _ => match cursor.checked_sub(1).and_then(|p| self.tokens.get(p)) {
                Some(Token::FieldName(name)) => Some(name),
                _ => None,
            },
        }
    }

    #[inline]
    fn position(&self) -> Option<usize> {
        self.cursor
    }
}

// -----------------------------------------------------------------------------
// ChainedStream

/// Replays a [`TokenBuffer`] and then continues with a live stream.
///
/// The chained stream starts positioned on the first buffered token. Once
/// the buffer is exhausted, `next_token` advances the live stream, which
/// keeps whatever position it had when the chain was created.
///
/// # Examples
///
/// ```
/// use vc_token::{ChainedStream, TokenBuffer, TokenKind, TokenSink, TokenStream};
///
/// let mut head = TokenBuffer::new();
/// head.write_start_array().unwrap();
///
/// let mut tail_buffer = TokenBuffer::new();
/// tail_buffer.write_int(1).unwrap();
/// tail_buffer.write_end_array().unwrap();
/// let mut tail = tail_buffer.into_stream();
///
/// let mut chained = ChainedStream::new(head, &mut tail).unwrap();
/// assert_eq!(chained.current_token(), Some(TokenKind::StartArray));
/// assert_eq!(chained.next_token().unwrap(), Some(TokenKind::ValueNumberInt));
/// assert_eq!(chained.next_token().unwrap(), Some(TokenKind::EndArray));
/// ```
pub struct ChainedStream<'a> {
    head: BufferStream,
    tail: &'a mut dyn TokenStream,
    in_head: bool,
}

impl<'a> ChainedStream<'a> {
    /// Chains `head` in front of `tail`.
    ///
    /// An empty head leaves the chain on the tail's current token.
    pub fn new(head: TokenBuffer, tail: &'a mut dyn TokenStream) -> Result<Self, StreamError> {
        let mut head = head.into_stream();
        let in_head = head.next_token()?.is_some();
        Ok(Self {
            head,
            tail,
            in_head,
        })
    }

    /// Returns `true` while buffered tokens are being replayed.
    #[inline]
    pub fn in_buffer(&self) -> bool {
        self.in_head
    }
}

impl TokenStream for ChainedStream<'_> {
    fn next_token(&mut self) -> Result<Option<TokenKind>, StreamError> {
        if self.in_head {
            if let Some(kind) = self.head.next_token()? {
                return Ok(Some(kind));
            }
            self.in_head = false;
        }
        self.tail.next_token()
    }

    #[inline]
    fn current(&self) -> Option<&Token> {
        if self.in_head {
            self.head.current()
        } else {
            self.tail.current()
        }
    }

    #[inline]
    fn current_name(&self) -> Option<&str> {
        if self.in_head {
            self.head.current_name()
        } else {
            self.tail.current_name()
        }
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.tail.close()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenBuffer {
        let mut buffer = TokenBuffer::new();
        buffer.write_start_object().unwrap();
        buffer.write_field_name("list").unwrap();
        buffer.write_start_array().unwrap();
        buffer.write_int(1).unwrap();
        buffer.write_start_object().unwrap();
        buffer.write_end_object().unwrap();
        buffer.write_end_array().unwrap();
        buffer.write_field_name("flag").unwrap();
        buffer.write_bool(true).unwrap();
        buffer.write_end_object().unwrap();
        buffer
    }

    #[test]
    fn unbalanced_writes_are_rejected() {
        let mut buffer = TokenBuffer::new();
        assert!(buffer.write_field_name("x").is_err());
        buffer.write_start_array().unwrap();
        assert!(buffer.write_end_object().is_err());
    }

    #[test]
    fn skip_children_stops_on_matching_end() {
        let mut stream = sample().into_stream();
        stream.next_token().unwrap();
        stream.next_token().unwrap();
        assert_eq!(stream.next_token().unwrap(), Some(TokenKind::StartArray));
        stream.skip_children().unwrap();
        assert_eq!(stream.current_token(), Some(TokenKind::EndArray));
        assert_eq!(stream.next_token().unwrap(), Some(TokenKind::FieldName));
        assert_eq!(stream.current_name(), Some("flag"));
        stream.next_token().unwrap();
        assert_eq!(stream.current_name(), Some("flag"));
        assert!(stream.bool_value().unwrap());
    }

    #[test]
    fn copy_current_structure_copies_one_value() {
        let mut stream = sample().into_stream();
        for _ in 0..3 {
            stream.next_token().unwrap();
        }
        let mut copy = TokenBuffer::new();
        copy.copy_current_structure(&mut stream).unwrap();
        assert_eq!(copy.len(), 5);
        assert!(copy.is_balanced());
        assert_eq!(stream.current_token(), Some(TokenKind::EndArray));
    }

    #[test]
    fn exhausted_stream_has_no_current_token() {
        let mut stream = TokenBuffer::new().into_stream();
        assert_eq!(stream.next_token().unwrap(), None);
        assert_eq!(stream.current_token(), None);
        assert_eq!(stream.next_token().unwrap(), None);
    }

    #[test]
    fn chained_stream_with_empty_head_uses_tail() {
        let mut tail = sample().into_stream();
        tail.next_token().unwrap();
        let chained = ChainedStream::new(TokenBuffer::new(), &mut tail).unwrap();
        assert!(!chained.in_buffer());
        assert_eq!(chained.current_token(), Some(TokenKind::StartObject));
    }
}
