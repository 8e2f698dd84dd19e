//! Items referenced by code generated with `#[derive(Bind)]`.
//!
//! Not part of the public API.

use alloc::format;
use core::any::Any;
use core::fmt::Debug;

use crate::error::BindError;
use crate::types::TypeDescriptor;
use crate::value::{EnumValue, FromValue, ToValue, Typed, Value};

pub use crate::introspect::{
    BindModel, Bindable, ClassModel, ClassRegistry, CreatorSpec, EnumModel, NamingStrategy,
};
pub use crate::value::Object;

/// Bound placed on every type parameter of a derived type.
pub trait BindParam: Bindable + ToValue + FromValue + Any + Clone + Debug + Send + Sync {}

impl<T> BindParam for T where T: Bindable + ToValue + FromValue + Any + Clone + Debug + Send + Sync {}

/// Extracts a derived struct from a decoded object.
pub fn object_from_value<T: Typed + Any>(value: Value) -> Result<T, BindError> {
    match value {
        Value::Object(object) => object.downcast::<T>().map_err(|object| {
            BindError::conversion(
                &T::type_descriptor(),
                format!("found an object of type `{}`", object.descriptor()),
            )
        }),
        other => Err(BindError::conversion(
            &T::type_descriptor(),
            format!("unexpected {} value", other.variant_name()),
        )),
    }
}

/// The constant of a derived enum.
#[inline]
pub fn enum_to_value<T: Typed>(index: usize, name: &str) -> Value {
    Value::Enum(EnumValue::new(T::type_descriptor(), index, name))
}

/// The ordinal of a derived enum's constant, from an enum value or its name.
pub fn enum_index<T: Typed>(value: &Value, names: &[&str]) -> Result<usize, BindError> {
    let index = match value {
        Value::Enum(constant) if constant.descriptor() == &T::type_descriptor() => {
            Some(constant.index()).filter(|&index| index < names.len())
        }
        Value::Text(name) => names.iter().position(|candidate| candidate == name),
        _ => None,
    };
    index.ok_or_else(|| unknown_constant::<T>(value))
}

/// A derived type with type parameters.
#[inline]
pub fn generic_bean<const N: usize>(name: &str, params: [TypeDescriptor; N]) -> TypeDescriptor {
    TypeDescriptor::bean_with_params(name, params.into())
}

#[cold]
pub fn unknown_constant<T: Typed>(value: &Value) -> BindError {
    let ty: TypeDescriptor = T::type_descriptor();
    BindError::conversion(&ty, format!("no constant matches {value:?}"))
}

// -----------------------------------------------------------------------------
// auto_register

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::introspect::{Bindable, ClassRegistry};

    /// A registration function submitted by a derived type.
    pub struct __AutoRegisterFunc(pub fn(&mut ClassRegistry));

    inventory::collect!(__AutoRegisterFunc);

    pub trait __RegisterType {
        fn __register(registry: &mut ClassRegistry);
    }

    impl<T: Bindable> __RegisterType for T {
        #[inline]
        fn __register(registry: &mut ClassRegistry) {
            registry.register::<T>();
        }
    }

    /// Runs every submitted registration.
    pub fn register_all(registry: &mut ClassRegistry) {
        let mut count = 0_usize;
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(registry);
            count += 1;
        }
        log::debug!("auto-registered {count} type(s), {} model(s) in total", registry.len());
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl Typed for Level {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::enumeration("Level")
        }
    }

    const NAMES: &[&str] = &["Low", "High"];

    #[test]
    fn enum_constants() {
        let high = enum_to_value::<Level>(1, "High");
        assert_eq!(enum_index::<Level>(&high, NAMES).unwrap(), 1);
        assert_eq!(enum_index::<Level>(&Value::text("Low"), NAMES).unwrap(), 0);
        assert!(enum_index::<Level>(&Value::text("Mid"), NAMES).is_err());
        assert!(enum_index::<Level>(&Value::Int(0), NAMES).is_err());
        let _ = (Level::Low, Level::High);
    }

    #[test]
    fn objects_of_other_types() {
        let value = Value::Object(Object::with_descriptor(TypeDescriptor::bean("Other"), 7_i32));
        let err = object_from_value::<Level>(value).unwrap_err();
        assert!(err.to_string().contains("Other"));
    }
}
