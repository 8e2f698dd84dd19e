use alloc::sync::{Arc, Weak};
use core::fmt;
use std::sync::OnceLock;

use arc_swap::ArcSwapOption;
use vc_token::TokenSink;

use crate::codec::{EncodeContext, Encoder};
use crate::error::BindError;
use crate::provider::{CodecFamily, Provider};
use crate::types::{TypeDescriptor, TypeKind};
use crate::value::Value;

// -----------------------------------------------------------------------------
// CodecSlot

/// A resolved nested codec.
///
/// Codecs that were still being built when the slot was filled are held
/// weakly: the provider cache owns them, and a strong reference would form a
/// cycle. If the cache was flushed since, the slot resolves the type again.
pub enum CodecSlot<C: ?Sized> {
    Strong(Arc<C>),
    Cyclic { codec: Weak<C>, ty: TypeDescriptor },
}

impl<C: CodecFamily + ?Sized> CodecSlot<C> {
    pub fn get(&self, provider: &Provider) -> Result<Arc<C>, BindError> {
        match self {
            Self::Strong(codec) => Ok(codec.clone()),
            Self::Cyclic { codec, ty } => match codec.upgrade() {
                Some(codec) => Ok(codec),
                None => C::resolve(provider, ty),
            },
        }
    }
}

impl<C: ?Sized> CodecSlot<C> {
    #[inline]
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::Cyclic { .. })
    }
}

impl<C: ?Sized> fmt::Debug for CodecSlot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong(_) => f.write_str("CodecSlot::Strong"),
            Self::Cyclic { ty, .. } => write!(f, "CodecSlot::Cyclic({ty})"),
        }
    }
}

// -----------------------------------------------------------------------------
// LinkedCodec

/// A nested codec filled in during the link phase.
pub struct LinkedCodec<C: ?Sized> {
    ty: TypeDescriptor,
    slot: OnceLock<CodecSlot<C>>,
}

impl<C: CodecFamily + ?Sized> LinkedCodec<C> {
    /// An unlinked codec for `ty`.
    #[inline]
    pub fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            slot: OnceLock::new(),
        }
    }

    /// A codec fixed up front, e.g. by an explicit override.
    pub fn with_codec(ty: TypeDescriptor, codec: Arc<C>) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(CodecSlot::Strong(codec));
        Self { ty, slot }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Resolves the codec through `provider`, once.
    pub fn link(&self, provider: &Provider) -> Result<(), BindError> {
        if self.slot.get().is_none() {
            let slot = C::resolve_slot(provider, &self.ty)?;
            // A concurrent link stored an equivalent slot.
            let _ = self.slot.set(slot);
        }
        Ok(())
    }

    /// The codec, resolving it on the spot when unlinked.
    #[inline]
    pub fn get(&self, provider: &Provider) -> Result<Arc<C>, BindError> {
        match self.slot.get() {
            Some(slot) => slot.get(provider),
            None => C::resolve(provider, &self.ty),
        }
    }
}

impl<C: ?Sized> fmt::Debug for LinkedCodec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedCodec")
            .field("ty", &self.ty)
            .field("slot", &self.slot.get())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MonomorphicCache

enum EncoderRef {
    Strong(Arc<dyn Encoder>),
    Weak(Weak<dyn Encoder>),
}

struct CacheEntry {
    ty: TypeDescriptor,
    encoder: EncoderRef,
}

/// Single-slot memo of "last runtime type → encoder".
///
/// Homogeneous sequences hit the slot on every element after the first;
/// a type change replaces the slot. Encoders owned by the provider cache
/// are held weakly.
#[derive(Default)]
pub struct MonomorphicCache {
    entry: ArcSwapOption<CacheEntry>,
}

impl MonomorphicCache {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The encoder for runtime type `ty`.
    pub fn get(&self, ty: &TypeDescriptor, provider: &Provider) -> Result<Arc<dyn Encoder>, BindError> {
        if let Some(entry) = self.entry.load().as_ref()
            && entry.ty == *ty
        {
            let encoder = match &entry.encoder {
                EncoderRef::Strong(encoder) => Some(encoder.clone()),
                EncoderRef::Weak(encoder) => encoder.upgrade(),
            };
            if let Some(encoder) = encoder {
                return Ok(encoder);
            }
        }

        log::trace!("inline cache miss for `{ty}`");
        let encoder = provider.resolve_encoder(ty)?;
        let held = if encoder.kind().is_cached() {
            EncoderRef::Weak(Arc::downgrade(&encoder))
        } else {
            EncoderRef::Strong(encoder.clone())
        };
        self.entry.store(Some(Arc::new(CacheEntry {
            ty: ty.clone(),
            encoder: held,
        })));
        Ok(encoder)
    }

    /// The runtime type currently memoized.
    pub fn cached_type(&self) -> Option<TypeDescriptor> {
        self.entry.load().as_ref().map(|entry| entry.ty.clone())
    }
}

impl fmt::Debug for MonomorphicCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonomorphicCache")
            .field("ty", &self.cached_type())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ValueWriter

/// Writes values of one declared type.
///
/// Concrete declarations resolve their encoder once, at link time. `Any`
/// and abstract declarations dispatch on each value's runtime type through a
/// [`MonomorphicCache`]; abstract ones also write the type id.
#[derive(Debug)]
pub enum ValueWriter {
    Static(LinkedCodec<dyn Encoder>),
    Dynamic {
        declared: TypeDescriptor,
        cache: MonomorphicCache,
    },
}

impl ValueWriter {
    pub fn for_type(ty: TypeDescriptor) -> Self {
        if ty.is_concrete() {
            Self::Static(LinkedCodec::new(ty))
        } else {
            Self::Dynamic {
                declared: ty,
                cache: MonomorphicCache::new(),
            }
        }
    }

    /// A writer fixed to `encoder`.
    #[inline]
    pub fn with_encoder(ty: TypeDescriptor, encoder: Arc<dyn Encoder>) -> Self {
        Self::Static(LinkedCodec::with_codec(ty, encoder))
    }

    pub fn declared(&self) -> &TypeDescriptor {
        match self {
            Self::Static(codec) => codec.descriptor(),
            Self::Dynamic { declared, .. } => declared,
        }
    }

    #[inline]
    pub fn link(&self, provider: &Provider) -> Result<(), BindError> {
        match self {
            Self::Static(codec) => codec.link(provider),
            Self::Dynamic { .. } => Ok(()),
        }
    }

    /// Whether `value` is empty according to its encoder.
    pub fn is_empty(&self, value: &Value, ctx: &EncodeContext<'_>) -> Result<bool, BindError> {
        match self {
            Self::Static(codec) if !value.is_null() => {
                Ok(codec.get(ctx.provider())?.is_empty(value))
            }
            _ => Ok(value.is_empty()),
        }
    }

    pub fn write(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        if value.is_null() {
            return ctx.write_null(sink);
        }
        match self {
            Self::Static(codec) => codec.get(ctx.provider())?.encode(value, sink, ctx),
            Self::Dynamic { declared, cache } => {
                let runtime = value.runtime_descriptor();
                let encoder = cache.get(&runtime, ctx.provider())?;
                let tagged = declared.kind() == TypeKind::Abstract
                    && matches!(value, Value::Object(_) | Value::Enum(_));
                if tagged {
                    let tag = ctx.provider().type_tag(declared, &runtime)?;
                    encoder.encode_with_type_tag(value, sink, ctx, &tag)
                } else {
                    encoder.encode(value, sink, ctx)
                }
            }
        }
    }
}
