use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::BindError;
use crate::types::{ScalarKind, TypeDescriptor};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Traits

/// A Rust type with a [`TypeDescriptor`].
///
/// Implemented for the built-in scalars and std containers, and for user
/// types by [`#[derive(Bind)]`](crate::derive::Bind).
pub trait Typed {
    fn type_descriptor() -> TypeDescriptor;
}

/// Converts a borrowed Rust value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Converts an owned [`Value`] back into a Rust value.
///
/// Container conversions annotate failures with the index or key of the
/// offending element.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, BindError>;
}

/// Merges a decoded value into an existing instance instead of replacing it.
///
/// Used by merge-getters: read-only container properties that are filled
/// in place.
pub trait MergeValue {
    fn merge_value(&mut self, value: Value) -> Result<(), BindError>;
}

#[inline(never)]
fn mismatch<T: Typed + ?Sized>(found: &Value) -> BindError {
    BindError::conversion(
        &T::type_descriptor(),
        format!("unexpected {} value", found.variant_name()),
    )
}

// -----------------------------------------------------------------------------
// Scalars

macro_rules! impl_integer {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Typed for $ty {
            #[inline]
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::scalar(ScalarKind::$kind)
            }
        }

        impl ToValue for $ty {
            #[inline]
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, BindError> {
                match value {
                    Value::Int(v) => <$ty>::try_from(v).map_err(|_| {
                        BindError::conversion(&Self::type_descriptor(), format!("{v} is out of range"))
                    }),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    )*};
}

impl_integer! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
}

impl Typed for u64 {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::U64)
    }
}

impl ToValue for u64 {
    #[inline]
    fn to_value(&self) -> Value {
        // Values above `i64::MAX` have no integer token.
        i64::try_from(*self).map_or(Value::Float(*self as f64), Value::Int)
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Int(v) => u64::try_from(v).map_err(|_| {
                BindError::conversion(&Self::type_descriptor(), format!("{v} is out of range"))
            }),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

macro_rules! impl_float {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Typed for $ty {
            #[inline]
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::scalar(ScalarKind::$kind)
            }
        }

        impl ToValue for $ty {
            #[inline]
            fn to_value(&self) -> Value {
                Value::Float(f64::from(*self))
            }
        }

        impl FromValue for $ty {
            #[allow(clippy::cast_possible_truncation, reason = "f64 narrowing is the intended conversion")]
            fn from_value(value: Value) -> Result<Self, BindError> {
                match value {
                    Value::Float(v) => Ok(v as $ty),
                    Value::Int(v) => Ok(v as $ty),
                    other => Err(mismatch::<Self>(&other)),
                }
            }
        }
    )*};
}

impl_float! {
    f32 => F32,
    f64 => F64,
}

impl Typed for bool {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::Bool)
    }
}

impl ToValue for bool {
    #[inline]
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Typed for char {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::Char)
    }
}

impl ToValue for char {
    #[inline]
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Text(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(BindError::conversion(
                        &Self::type_descriptor(),
                        format!("{text:?} is not a single character"),
                    )),
                }
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Typed for String {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::String)
    }
}

impl ToValue for String {
    #[inline]
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// Owned binary payload, bound as a scalar rather than a list of `u8`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Typed for Bytes {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::Bytes)
    }
}

impl ToValue for Bytes {
    #[inline]
    fn to_value(&self) -> Value {
        Value::Binary(self.0.clone())
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Binary(bytes) => Ok(Self(bytes)),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Typed for Uuid {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::Uuid)
    }
}

impl ToValue for Uuid {
    #[inline]
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Uuid(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Typed for DateTime<Utc> {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::Timestamp)
    }
}

impl ToValue for DateTime<Utc> {
    #[inline]
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl Typed for Value {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::any()
    }
}

impl ToValue for Value {
    #[inline]
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    #[inline]
    fn from_value(value: Value) -> Result<Self, BindError> {
        Ok(value)
    }
}

// -----------------------------------------------------------------------------
// Wrappers

impl<T: Typed> Typed for Option<T> {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::type_descriptor())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    #[inline]
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    #[inline]
    fn from_value(value: Value) -> Result<Self, BindError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Typed + ?Sized> Typed for Box<T> {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    #[inline]
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: FromValue> FromValue for Box<T> {
    #[inline]
    fn from_value(value: Value) -> Result<Self, BindError> {
        T::from_value(value).map(Box::new)
    }
}

// -----------------------------------------------------------------------------
// Sequences

fn list_from_value<T, C>(value: Value) -> Result<C, BindError>
where
    T: FromValue,
    C: FromIterator<T> + Typed,
{
    match value {
        Value::List(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| T::from_value(item).map_err(|e| e.with_index(index)))
            .collect(),
        other => Err(mismatch::<C>(&other)),
    }
}

fn merge_list<T, C>(target: &mut C, value: Value) -> Result<(), BindError>
where
    T: FromValue,
    C: Extend<T> + Typed,
{
    match value {
        Value::Null => Ok(()),
        Value::List(items) => {
            let mut decoded = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                decoded.push(T::from_value(item).map_err(|e| e.with_index(index))?);
            }
            target.extend(decoded);
            Ok(())
        }
        other => Err(mismatch::<C>(&other)),
    }
}

macro_rules! impl_sequence {
    ($ctor:ident => $($ty:ident<T $(: $($bound:path),+)?>),* $(,)?) => {$(
        impl<T: Typed $($(+ $bound)+)?> Typed for $ty<T> {
            #[inline]
            fn type_descriptor() -> TypeDescriptor {
                TypeDescriptor::$ctor(T::type_descriptor())
            }
        }

        impl<T: ToValue $($(+ $bound)+)?> ToValue for $ty<T> {
            fn to_value(&self) -> Value {
                Value::List(self.iter().map(ToValue::to_value).collect())
            }
        }

        impl<T: Typed + FromValue $($(+ $bound)+)?> FromValue for $ty<T> {
            #[inline]
            fn from_value(value: Value) -> Result<Self, BindError> {
                list_from_value::<T, Self>(value)
            }
        }

        impl<T: Typed + FromValue $($(+ $bound)+)?> MergeValue for $ty<T> {
            #[inline]
            fn merge_value(&mut self, value: Value) -> Result<(), BindError> {
                merge_list::<T, Self>(self, value)
            }
        }
    )*};
}

impl_sequence!(list => Vec<T>, VecDeque<T>);
impl_sequence!(set => BTreeSet<T: Ord>);

impl<T: Typed + Eq + Hash, S: BuildHasher> Typed for HashSet<T, S> {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::set(T::type_descriptor())
    }
}

impl<T: ToValue + Eq + Hash, S: BuildHasher> ToValue for HashSet<T, S> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T, S> FromValue for HashSet<T, S>
where
    T: Typed + FromValue + Eq + Hash,
    S: BuildHasher + Default,
{
    #[inline]
    fn from_value(value: Value) -> Result<Self, BindError> {
        list_from_value::<T, Self>(value)
    }
}

impl<T, S> MergeValue for HashSet<T, S>
where
    T: Typed + FromValue + Eq + Hash,
    S: BuildHasher,
{
    #[inline]
    fn merge_value(&mut self, value: Value) -> Result<(), BindError> {
        merge_list::<T, Self>(self, value)
    }
}

// -----------------------------------------------------------------------------
// Maps

fn map_entries<K: FromValue, V: FromValue>(
    value: Value,
    ty: impl FnOnce() -> TypeDescriptor,
) -> Result<Vec<(K, V)>, BindError> {
    match value {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(key, item)| {
                let label = key.to_string();
                let key = K::from_value(key).map_err(|e| e.with_key(&label))?;
                let item = V::from_value(item).map_err(|e| e.with_key(&label))?;
                Ok((key, item))
            })
            .collect(),
        other => Err(BindError::conversion(
            &ty(),
            format!("unexpected {} value", other.variant_name()),
        )),
    }
}

fn map_to_value<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Value
where
    K: ToValue + 'a,
    V: ToValue + 'a,
{
    Value::Map(entries.map(|(k, v)| (k.to_value(), v.to_value())).collect())
}

impl<K: Typed, V: Typed, S> Typed for HashMap<K, V, S> {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::type_descriptor(), V::type_descriptor())
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    #[inline]
    fn to_value(&self) -> Value {
        map_to_value(self.iter())
    }
}

impl<K, V, S> FromValue for HashMap<K, V, S>
where
    K: Typed + FromValue + Eq + Hash,
    V: Typed + FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> Result<Self, BindError> {
        Ok(map_entries(value, Self::type_descriptor)?.into_iter().collect())
    }
}

impl<K, V, S> MergeValue for HashMap<K, V, S>
where
    K: Typed + FromValue + Eq + Hash,
    V: Typed + FromValue,
    S: BuildHasher,
{
    fn merge_value(&mut self, value: Value) -> Result<(), BindError> {
        if value.is_null() {
            return Ok(());
        }
        self.extend(map_entries::<K, V>(value, Self::type_descriptor)?);
        Ok(())
    }
}

impl<K: Typed, V: Typed> Typed for BTreeMap<K, V> {
    #[inline]
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(K::type_descriptor(), V::type_descriptor())
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    #[inline]
    fn to_value(&self) -> Value {
        map_to_value(self.iter())
    }
}

impl<K, V> FromValue for BTreeMap<K, V>
where
    K: Typed + FromValue + Ord,
    V: Typed + FromValue,
{
    fn from_value(value: Value) -> Result<Self, BindError> {
        Ok(map_entries(value, Self::type_descriptor)?.into_iter().collect())
    }
}

impl<K, V> MergeValue for BTreeMap<K, V>
where
    K: Typed + FromValue + Ord,
    V: Typed + FromValue,
{
    fn merge_value(&mut self, value: Value) -> Result<(), BindError> {
        if value.is_null() {
            return Ok(());
        }
        self.extend(map_entries::<K, V>(value, Self::type_descriptor)?);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PathSegment};

    #[test]
    fn integer_range_is_checked() {
        assert_eq!(i8::from_value(Value::Int(-128)).unwrap(), -128);
        let err = u8::from_value(Value::Int(256)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueConversionFailure { .. }));
    }

    #[test]
    fn list_errors_carry_the_index() {
        let value = Value::List(vec![Value::Int(1), Value::text("x")]);
        let err = Vec::<i32>::from_value(value).unwrap_err();
        assert_eq!(err.path().collect::<Vec<_>>(), [&PathSegment::Index(1)]);
    }

    #[test]
    fn map_round_trip_through_values() {
        let mut map = BTreeMap::new();
        map.insert(3u32, String::from("c"));
        map.insert(1u32, String::from("a"));
        let back = BTreeMap::<u32, String>::from_value(map.to_value()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn merge_extends_in_place() {
        let mut items = vec![1, 2];
        items
            .merge_value(Value::List(vec![Value::Int(3)]))
            .unwrap();
        items.merge_value(Value::Null).unwrap();
        assert_eq!(items, [1, 2, 3]);
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Some(5i64).to_value().as_i64(), Some(5));
        assert_eq!(
            Option::<i32>::type_descriptor().to_string(),
            "Option<i32>"
        );
    }
}
