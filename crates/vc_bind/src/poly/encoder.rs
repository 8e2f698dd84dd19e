use vc_token::TokenSink;

use crate::codec::{CodecKind, EncodeContext, Encoder, ValueWriter};
use crate::error::BindError;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// Encoder of an abstract declared type.
///
/// Dispatches on the runtime type of each value and writes its type id,
/// see [`ValueWriter`].
#[derive(Debug)]
pub struct PolymorphicEncoder {
    writer: ValueWriter,
}

impl PolymorphicEncoder {
    #[inline]
    pub fn new(declared: TypeDescriptor) -> Self {
        Self {
            writer: ValueWriter::for_type(declared),
        }
    }
}

impl Encoder for PolymorphicEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        self.writer.declared()
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Placeholder
    }

    #[inline]
    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        self.writer.write(value, sink, ctx)
    }
}
