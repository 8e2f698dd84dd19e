use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::types::TypeDescriptor;
use crate::value::Typed;

// -----------------------------------------------------------------------------
// ObjectData

trait ObjectData: Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn ObjectData>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Any + Clone + fmt::Debug + Send + Sync> ObjectData for T {
    #[inline]
    fn clone_box(&self) -> Box<dyn ObjectData> {
        Box::new(self.clone())
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// -----------------------------------------------------------------------------
// Object

/// A type-erased bean instance tagged with its runtime type.
///
/// The descriptor is the instance's *runtime class*: encoders for abstract
/// or untyped declarations dispatch on it.
///
/// # Examples
///
/// ```
/// use vc_bind::types::TypeDescriptor;
/// use vc_bind::value::Object;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let object = Object::with_descriptor(TypeDescriptor::bean("Point"), Point { x: 1, y: 2 });
/// assert_eq!(object.descriptor().name(), "Point");
/// assert_eq!(object.downcast_ref::<Point>().unwrap().y, 2);
///
/// let point: Point = object.downcast().unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
pub struct Object {
    descriptor: TypeDescriptor,
    data: Box<dyn ObjectData>,
}

impl Object {
    /// Wraps `value` under the descriptor of its Rust type.
    #[inline]
    pub fn new<T>(value: T) -> Self
    where
        T: Typed + Any + Clone + fmt::Debug + Send + Sync,
    {
        Self::with_descriptor(T::type_descriptor(), value)
    }

    /// Wraps `value` under an explicit descriptor.
    #[inline]
    pub fn with_descriptor<T>(descriptor: TypeDescriptor, value: T) -> Self
    where
        T: Any + Clone + fmt::Debug + Send + Sync,
    {
        Self {
            descriptor,
            data: Box::new(value),
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.data.as_any().is::<T>()
    }

    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        self.data.as_any()
    }

    #[inline]
    pub fn as_any_mut(&mut self) -> &mut dyn Any {
        self.data.as_any_mut()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_any_mut().downcast_mut()
    }

    /// Takes the instance out, or gives the object back on a type mismatch.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.data.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            // Checked above.
            Err(_) => unreachable!(),
        }
    }
}

impl Clone for Object {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            data: self.data.clone_box(),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.descriptor)?;
        self.data.debug(f)
    }
}
