use vc_token::TokenSink;

use crate::codec::{CodecKind, EncodeContext, Encoder};
use crate::error::BindError;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// Writes every value as `null`.
///
/// The default null encoder of a [`Module`](crate::Module).
#[derive(Debug)]
pub struct NullEncoder {
    descriptor: TypeDescriptor,
}

impl NullEncoder {
    #[inline]
    pub fn new() -> Self {
        Self {
            descriptor: TypeDescriptor::any(),
        }
    }
}

impl Encoder for NullEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Custom
    }

    #[inline]
    fn encode(
        &self,
        _value: &Value,
        sink: &mut dyn TokenSink,
        _ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        sink.write_null()?;
        Ok(())
    }
}
