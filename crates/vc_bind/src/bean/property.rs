use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use vc_token::TokenSink;

use crate::codec::{Decoder, EncodeContext, Encoder, LinkedCodec, ValueWriter};
use crate::config::Inclusion;
use crate::error::BindError;
use crate::introspect::{AccessorKind, GetFn, SetFn};
use crate::provider::Provider;
use crate::types::TypeDescriptor;
use crate::value::Value;

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// A property the bean decoder can bind.
///
/// Creator arguments carry their argument index and no setter: they are
/// consumed by the creator and never assigned afterwards.
pub struct PropertyDescriptor {
    name: String,
    accessor: AccessorKind,
    decoder: LinkedCodec<dyn Decoder>,
    setter: Option<SetFn>,
    creator_index: Option<usize>,
}

impl PropertyDescriptor {
    /// A property written through `setter`.
    pub fn settable(
        name: impl Into<String>,
        ty: TypeDescriptor,
        accessor: AccessorKind,
        setter: SetFn,
    ) -> Self {
        Self {
            name: name.into(),
            accessor,
            decoder: LinkedCodec::new(ty),
            setter: Some(setter),
            creator_index: None,
        }
    }

    /// Argument `index` of a property-based creator.
    pub fn creator_argument(name: impl Into<String>, ty: TypeDescriptor, index: usize) -> Self {
        Self {
            name: name.into(),
            accessor: AccessorKind::CreatorArgument,
            decoder: LinkedCodec::new(ty),
            setter: None,
            creator_index: Some(index),
        }
    }

    /// Fixes the decoder instead of resolving it at link time.
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = LinkedCodec::with_codec(self.decoder.descriptor().clone(), decoder);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.decoder.descriptor()
    }

    #[inline]
    pub fn accessor(&self) -> AccessorKind {
        self.accessor
    }

    #[inline]
    pub fn creator_index(&self) -> Option<usize> {
        self.creator_index
    }

    #[inline]
    pub fn decoder(&self, provider: &Provider) -> Result<Arc<dyn Decoder>, BindError> {
        self.decoder.get(provider)
    }

    /// Assigns `value` to `instance`. Creator arguments ignore the call.
    #[inline]
    pub fn set(&self, instance: &mut dyn Any, value: Value) -> Result<(), BindError> {
        match &self.setter {
            Some(setter) => setter(instance, value),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.decoder.link(provider)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("accessor", &self.accessor)
            .field("decoder", &self.decoder)
            .field("creator_index", &self.creator_index)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// PropertyWriter

/// A property the bean encoder writes.
pub struct PropertyWriter {
    name: String,
    getter: GetFn,
    writer: ValueWriter,
    inclusion: Option<Inclusion>,
}

impl PropertyWriter {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor, getter: GetFn) -> Self {
        Self {
            name: name.into(),
            getter,
            writer: ValueWriter::for_type(ty),
            inclusion: None,
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.writer = ValueWriter::with_encoder(self.writer.declared().clone(), encoder);
        self
    }

    #[inline]
    pub fn with_inclusion(mut self, inclusion: Option<Inclusion>) -> Self {
        self.inclusion = inclusion;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.writer.declared()
    }

    /// Writes the field name and value, unless the inclusion rule skips it.
    ///
    /// Returns whether the property was written.
    pub fn write(
        &self,
        instance: &dyn Any,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<bool, BindError> {
        let annotate = |err: BindError| err.with_property(&self.name);
        let value = (self.getter)(instance).map_err(annotate)?;
        let included = match self.inclusion.unwrap_or(ctx.config().inclusion) {
            Inclusion::Always => true,
            Inclusion::NonNull => !value.is_null(),
            Inclusion::NonEmpty => !self.writer.is_empty(&value, ctx).map_err(annotate)?,
        };
        if included {
            sink.write_field_name(&self.name)?;
            self.writer.write(&value, sink, ctx).map_err(annotate)?;
        }
        Ok(included)
    }

    #[inline]
    pub fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.writer.link(provider)
    }
}

impl fmt::Debug for PropertyWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyWriter")
            .field("name", &self.name)
            .field("writer", &self.writer)
            .field("inclusion", &self.inclusion)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// DelegateWriter

/// Writes a whole instance as the one value its value getter returns.
pub struct DelegateWriter {
    getter: GetFn,
    writer: ValueWriter,
}

impl DelegateWriter {
    pub fn new(ty: TypeDescriptor, getter: GetFn) -> Self {
        Self {
            getter,
            writer: ValueWriter::for_type(ty),
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.writer.declared()
    }

    pub fn write(
        &self,
        instance: &dyn Any,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let value = (self.getter)(instance)?;
        self.writer.write(&value, sink, ctx)
    }

    #[inline]
    pub fn link(&self, provider: &Provider) -> Result<(), BindError> {
        self.writer.link(provider)
    }
}

impl fmt::Debug for DelegateWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateWriter")
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}
