use alloc::string::String;
use alloc::vec::Vec;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{StreamError, Token, TokenKind};

// -----------------------------------------------------------------------------
// TokenStream

/// A pull-based reader of [`Token`]s.
///
/// A stream is always positioned on a *current* token (or on nothing,
/// before the first [`next_token`] call and after the end of input).
/// Scalar accessors read the payload of the current token.
///
/// Implementors only provide [`next_token`], [`current`] and
/// [`current_name`]; the accessors are derived from them.
///
/// # Examples
///
/// ```
/// use vc_token::{TokenBuffer, TokenKind, TokenSink, TokenStream};
///
/// let mut buffer = TokenBuffer::new();
/// buffer.write_start_array().unwrap();
/// buffer.write_int(7).unwrap();
/// buffer.write_end_array().unwrap();
///
/// let mut stream = buffer.into_stream();
/// assert_eq!(stream.next_token().unwrap(), Some(TokenKind::StartArray));
/// assert_eq!(stream.next_token().unwrap(), Some(TokenKind::ValueNumberInt));
/// assert_eq!(stream.int_value().unwrap(), 7);
/// ```
///
/// [`next_token`]: TokenStream::next_token
/// [`current`]: TokenStream::current
/// [`current_name`]: TokenStream::current_name
pub trait TokenStream {
    /// Advances to the next token and returns its kind,
    /// or `None` once the input is exhausted.
    fn next_token(&mut self) -> Result<Option<TokenKind>, StreamError>;

    /// The current token, if any.
    fn current(&self) -> Option<&Token>;

    /// The field name associated with the current token.
    ///
    /// For a `FieldName` token this is the name itself; for a value
    /// directly following a field name it is that name.
    fn current_name(&self) -> Option<&str>;

    /// Index of the current token within the input, if the stream tracks it.
    fn position(&self) -> Option<usize> {
        None
    }

    /// Releases the underlying input.
    fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }

    /// The kind of the current token.
    #[inline]
    fn current_token(&self) -> Option<TokenKind> {
        self.current().map(Token::kind)
    }

    /// Text of the current `ValueString` or `FieldName` token.
    fn text(&self) -> Result<&str, StreamError> {
        match self.current() {
            Some(Token::String(s) | Token::FieldName(s)) => Ok(s),
            Some(other) => Err(StreamError::mismatch("text", other.kind())),
            None => Err(StreamError::NoCurrentToken),
        }
    }

    /// Integer payload of the current `ValueNumberInt` token.
    fn int_value(&self) -> Result<i64, StreamError> {
        match self.current() {
            Some(Token::Int(v)) => Ok(*v),
            Some(other) => Err(StreamError::mismatch("integer", other.kind())),
            None => Err(StreamError::NoCurrentToken),
        }
    }

    /// Numeric payload of the current number token, widened to `f64`.
    fn float_value(&self) -> Result<f64, StreamError> {
        match self.current() {
            Some(Token::Float(v)) => Ok(*v),
            Some(Token::Int(v)) => Ok(*v as f64),
            Some(other) => Err(StreamError::mismatch("number", other.kind())),
            None => Err(StreamError::NoCurrentToken),
        }
    }

    /// Boolean payload of the current `ValueTrue`/`ValueFalse` token.
    fn bool_value(&self) -> Result<bool, StreamError> {
        match self.current() {
            Some(Token::Bool(v)) => Ok(*v),
            Some(other) => Err(StreamError::mismatch("boolean", other.kind())),
            None => Err(StreamError::NoCurrentToken),
        }
    }

    /// Binary payload of the current token.
    ///
    /// Embedded tokens are returned as is, string tokens are decoded as
    /// standard base64.
    fn binary_value(&self) -> Result<Vec<u8>, StreamError> {
        match self.current() {
            Some(Token::Embedded(bytes)) => Ok(bytes.clone()),
            Some(Token::String(text)) => Ok(STANDARD.decode(text)?),
            Some(other) => Err(StreamError::mismatch("binary", other.kind())),
            None => Err(StreamError::NoCurrentToken),
        }
    }

    /// Copies the text of the current token into an owned string.
    #[inline]
    fn text_owned(&self) -> Result<String, StreamError> {
        self.text().map(String::from)
    }

    /// Skips the children of the current container token.
    ///
    /// When the current token is `StartObject` or `StartArray`, the stream
    /// is advanced to the matching end token. Otherwise this does nothing.
    fn skip_children(&mut self) -> Result<(), StreamError> {
        match self.current_token() {
            Some(kind) if kind.is_struct_start() => {}
            _ => return Ok(()),
        }

        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                Some(kind) if kind.is_struct_start() => depth += 1,
                Some(kind) if kind.is_struct_end() => depth -= 1,
                Some(_) => {}
                None => return Err(StreamError::UnexpectedEof),
            }
        }
        Ok(())
    }

    /// Advances and fails with [`StreamError::UnexpectedEof`] at the end of input.
    #[inline]
    fn expect_next(&mut self) -> Result<TokenKind, StreamError> {
        self.next_token()?.ok_or(StreamError::UnexpectedEof)
    }
}

impl<S: TokenStream + ?Sized> TokenStream for &mut S {
    #[inline]
    fn next_token(&mut self) -> Result<Option<TokenKind>, StreamError> {
        (**self).next_token()
    }

    #[inline]
    fn current(&self) -> Option<&Token> {
        (**self).current()
    }

    #[inline]
    fn current_name(&self) -> Option<&str> {
        (**self).current_name()
    }

    #[inline]
    fn position(&self) -> Option<usize> {
        (**self).position()
    }

    #[inline]
    fn close(&mut self) -> Result<(), StreamError> {
        (**self).close()
    }
}
