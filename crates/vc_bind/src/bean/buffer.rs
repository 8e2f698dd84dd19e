use alloc::string::String;
use alloc::vec::Vec;
use core::mem;

use crate::error::BindError;
use crate::value::Value;

/// A property decoded before the instance existed.
#[derive(Debug)]
pub enum Buffered {
    /// Index into the decoder's property table.
    Property(usize, Value),
    /// For the any-setter.
    Any(String, Value),
}

/// Collects property-based creator arguments that arrive in any order.
///
/// Arguments are stored by their creator index; every other property seen
/// before the last argument goes to an overflow list, replayed in arrival
/// order once the instance exists.
///
/// # Examples
///
/// ```
/// use vc_bind::bean::PropertyValueBuffer;
/// use vc_bind::Value;
///
/// let mut buffer = PropertyValueBuffer::new(2);
/// buffer.buffer_property(7, Value::Int(1));
/// assert!(!buffer.set_arg(1, Value::Int(2)));
/// assert!(buffer.set_arg(0, Value::Int(3)));
///
/// let args = buffer.take_args(|_| unreachable!()).unwrap();
/// assert_eq!(args.len(), 2);
/// assert_eq!(buffer.take_buffered().len(), 1);
/// ```
#[derive(Debug)]
pub struct PropertyValueBuffer {
    args: Vec<Option<Value>>,
    missing: usize,
    buffered: Vec<Buffered>,
}

impl PropertyValueBuffer {
    pub fn new(arity: usize) -> Self {
        Self {
            args: (0..arity).map(|_| None).collect(),
            missing: arity,
            buffered: Vec::new(),
        }
    }

    /// Stores argument `index`. Returns `true` when it was the last one
    /// outstanding.
    ///
    /// A repeated argument replaces the earlier value.
    pub fn set_arg(&mut self, index: usize, value: Value) -> bool {
        let Some(slot) = self.args.get_mut(index) else {
            return false;
        };
        if slot.replace(value).is_none() {
            self.missing -= 1;
            return self.missing == 0;
        }
        false
    }

    #[inline]
    pub fn buffer_property(&mut self, index: usize, value: Value) {
        self.buffered.push(Buffered::Property(index, value));
    }

    #[inline]
    pub fn buffer_any(&mut self, name: impl Into<String>, value: Value) {
        self.buffered.push(Buffered::Any(name.into(), value));
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing == 0
    }

    #[inline]
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// The creator arguments, with `absent(index)` standing in for those
    /// that never arrived.
    pub fn take_args(
        &mut self,
        mut absent: impl FnMut(usize) -> Result<Value, BindError>,
    ) -> Result<Vec<Value>, BindError> {
        let slots = mem::take(&mut self.args);
        self.missing = 0;
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Some(value) => Ok(value),
                None => absent(index),
            })
            .collect()
    }

    /// Properties buffered so far, in arrival order.
    #[inline]
    pub fn take_buffered(&mut self) -> Vec<Buffered> {
        mem::take(&mut self.buffered)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;

    #[test]
    fn repeated_args_count_once() {
        let mut buffer = PropertyValueBuffer::new(2);
        assert!(!buffer.set_arg(0, Value::Int(1)));
        assert!(!buffer.set_arg(0, Value::Int(2)));
        assert_eq!(buffer.missing(), 1);
        assert!(buffer.set_arg(1, Value::Int(3)));
        assert!(buffer.is_complete());

        let args = buffer.take_args(|_| Ok(Value::Null)).unwrap();
        assert_eq!(args[0].as_i64(), Some(2));
    }

    #[test]
    fn missing_args_use_absent_values() {
        let mut buffer = PropertyValueBuffer::new(3);
        buffer.set_arg(1, Value::text("b"));
        let args = buffer.take_args(|index| Ok(Value::Int(index as i64))).unwrap();
        assert_eq!(args[0].as_i64(), Some(0));
        assert_eq!(args[1].as_str(), Some("b"));
        assert_eq!(args[2].as_i64(), Some(2));

        let mut buffer = PropertyValueBuffer::new(1);
        let ty = TypeDescriptor::bean("Strict");
        let err = buffer
            .take_args(|_| Err(BindError::conversion(&ty, "missing")))
            .unwrap_err();
        assert_eq!(err.path_string(), "$");
    }

    #[test]
    fn buffered_properties_keep_arrival_order() {
        let mut buffer = PropertyValueBuffer::new(1);
        buffer.buffer_any("z", Value::Int(0));
        buffer.buffer_property(4, Value::Int(1));
        buffer.buffer_any("a", Value::Int(2));

        let order: Vec<_> = buffer
            .take_buffered()
            .into_iter()
            .map(|buffered| match buffered {
                Buffered::Property(index, _) => alloc::format!("#{index}"),
                Buffered::Any(name, _) => name,
            })
            .collect();
        assert_eq!(order, ["z", "#4", "a"]);
        assert!(buffer.take_buffered().is_empty());
    }
}
