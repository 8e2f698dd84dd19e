use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::LazyLock;

use crate::codec::{Decoder, Encoder, ScalarDecoder, ScalarEncoder, UntypedDecoder, UntypedEncoder};
use crate::types::{ScalarKind, TypeDescriptor, TypeKind};

// -----------------------------------------------------------------------------
// Shape

/// The codec family serving a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar(ScalarKind),
    /// Built directly around element codecs, never cached.
    Container,
    Enum,
    Untyped,
    /// Stand-in for an abstract type.
    Placeholder,
    Bean,
}

struct Probe {
    matches: fn(&TypeDescriptor) -> bool,
    shape: fn(&TypeDescriptor) -> Shape,
}

// Checked in order, first match wins.
static PROBES: [Probe; 6] = [
    Probe {
        matches: TypeDescriptor::is_scalar,
        shape: |ty| match ty.kind() {
            TypeKind::Scalar(kind) => Shape::Scalar(kind),
            _ => Shape::Untyped,
        },
    },
    Probe {
        matches: |ty| ty.kind() == TypeKind::Any,
        shape: |_| Shape::Untyped,
    },
    Probe {
        matches: TypeDescriptor::is_container,
        shape: |_| Shape::Container,
    },
    Probe {
        matches: TypeDescriptor::is_enum,
        shape: |_| Shape::Enum,
    },
    Probe {
        matches: |ty| ty.kind() == TypeKind::Abstract,
        shape: |_| Shape::Placeholder,
    },
    Probe {
        matches: |ty| ty.kind() == TypeKind::Bean,
        shape: |_| Shape::Bean,
    },
];

/// The codec family of `ty`.
///
/// # Examples
///
/// ```
/// use vc_bind::codec::{Shape, classify};
/// use vc_bind::types::{ScalarKind, TypeDescriptor};
///
/// assert_eq!(classify(&TypeDescriptor::scalar(ScalarKind::I32)), Shape::Scalar(ScalarKind::I32));
/// assert_eq!(classify(&TypeDescriptor::list(TypeDescriptor::any())), Shape::Container);
/// assert_eq!(classify(&TypeDescriptor::abstract_type("Shape")), Shape::Placeholder);
/// ```
pub fn classify(ty: &TypeDescriptor) -> Shape {
    PROBES
        .iter()
        .find(|probe| (probe.matches)(ty))
        .map_or(Shape::Bean, |probe| (probe.shape)(ty))
}

// -----------------------------------------------------------------------------
// Static tables

static SCALAR_DECODERS: LazyLock<Vec<Arc<dyn Decoder>>> = LazyLock::new(|| {
    ScalarKind::ALL
        .iter()
        .map(|&kind| Arc::new(ScalarDecoder::new(kind)) as Arc<dyn Decoder>)
        .collect()
});

static SCALAR_ENCODERS: LazyLock<Vec<Arc<dyn Encoder>>> = LazyLock::new(|| {
    ScalarKind::ALL
        .iter()
        .map(|&kind| Arc::new(ScalarEncoder::new(kind)) as Arc<dyn Encoder>)
        .collect()
});

static UNTYPED_DECODER: LazyLock<Arc<dyn Decoder>> =
    LazyLock::new(|| Arc::new(UntypedDecoder::new()));

static UNTYPED_ENCODER: LazyLock<Arc<dyn Encoder>> =
    LazyLock::new(|| Arc::new(UntypedEncoder::new()));

/// The shared decoder of a scalar or `Any` descriptor.
///
/// Lookups never lock and always return the same instance.
pub fn builtin_decoder(ty: &TypeDescriptor) -> Option<Arc<dyn Decoder>> {
    match ty.kind() {
        TypeKind::Scalar(kind) => SCALAR_DECODERS.get(kind as usize).cloned(),
        TypeKind::Any => Some(UNTYPED_DECODER.clone()),
        _ => None,
    }
}

/// The shared encoder of a scalar or `Any` descriptor.
pub fn builtin_encoder(ty: &TypeDescriptor) -> Option<Arc<dyn Encoder>> {
    match ty.kind() {
        TypeKind::Scalar(kind) => SCALAR_ENCODERS.get(kind as usize).cloned(),
        TypeKind::Any => Some(UNTYPED_ENCODER.clone()),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_shared() {
        let ty = TypeDescriptor::scalar(ScalarKind::Uuid);
        let a = builtin_decoder(&ty).unwrap();
        let b = builtin_decoder(&ty).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.descriptor(), &ty);
        assert!(builtin_encoder(&TypeDescriptor::bean("User")).is_none());
    }

    #[test]
    fn every_scalar_has_a_codec() {
        for kind in ScalarKind::ALL {
            let ty = TypeDescriptor::scalar(kind);
            assert_eq!(builtin_decoder(&ty).unwrap().descriptor(), &ty);
            assert_eq!(builtin_encoder(&ty).unwrap().descriptor(), &ty);
        }
    }

    #[test]
    fn classify_shapes() {
        assert_eq!(classify(&TypeDescriptor::any()), Shape::Untyped);
        assert_eq!(classify(&TypeDescriptor::enumeration("Color")), Shape::Enum);
        assert_eq!(
            classify(&TypeDescriptor::optional(TypeDescriptor::bean("User"))),
            Shape::Container
        );
        assert_eq!(classify(&TypeDescriptor::bean("User")), Shape::Bean);
    }
}
