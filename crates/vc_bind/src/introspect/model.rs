use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, type_name};
use core::fmt;
use core::marker::PhantomData;
use core::mem;

use crate::codec::{Decoder, Encoder};
use crate::config::Inclusion;
use crate::error::BindError;
use crate::introspect::NamingStrategy;
use crate::types::TypeDescriptor;
use crate::value::{FromValue, MergeValue, Object, ToValue, Typed, Value};

// -----------------------------------------------------------------------------
// Accessor closures

/// Writes a decoded value into an instance.
pub type SetFn = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), BindError> + Send + Sync>;

/// Reads a property of an instance.
pub type GetFn = Arc<dyn Fn(&dyn Any) -> Result<Value, BindError> + Send + Sync>;

/// Receives properties that match no declared member.
pub type AnySetFn = Arc<dyn Fn(&mut dyn Any, &str, Value) -> Result<(), BindError> + Send + Sync>;

/// Invokes a constructor or factory.
pub type CreateFn = Arc<dyn Fn(&mut CreatorArgs<'_>) -> Result<Object, BindError> + Send + Sync>;

#[inline(never)]
fn instance_mismatch<T>(ty: &TypeDescriptor) -> BindError {
    BindError::conversion(ty, format!("instance is not a `{}`", type_name::<T>()))
}

fn downcast_mut<'a, T: Any>(target: &'a mut dyn Any, ty: &TypeDescriptor) -> Result<&'a mut T, BindError> {
    target.downcast_mut::<T>().ok_or_else(|| instance_mismatch::<T>(ty))
}

fn downcast_ref<'a, T: Any>(target: &'a dyn Any, ty: &TypeDescriptor) -> Result<&'a T, BindError> {
    target.downcast_ref::<T>().ok_or_else(|| instance_mismatch::<T>(ty))
}

// -----------------------------------------------------------------------------
// AccessorKind

/// How a property is reached on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Field,
    Setter,
    Getter,
    /// A getter of a mutable container, decoded by merging into it.
    MergeGetter,
    CreatorArgument,
}

impl AccessorKind {
    /// Rank among settable accessors sharing one name, lowest wins.
    #[inline]
    pub const fn settable_rank(self) -> Option<u8> {
        match self {
            Self::Setter => Some(0),
            Self::Field => Some(1),
            Self::MergeGetter => Some(2),
            _ => None,
        }
    }

    /// Rank among readable accessors sharing one name, lowest wins.
    #[inline]
    pub const fn readable_rank(self) -> Option<u8> {
        match self {
            Self::Getter => Some(0),
            Self::Field => Some(1),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Setter => "setter",
            Self::Getter => "getter",
            Self::MergeGetter => "merge-getter",
            Self::CreatorArgument => "creator argument",
        }
    }
}

// -----------------------------------------------------------------------------
// CodecOverride

/// Explicit codecs attached to one property.
#[derive(Clone, Default)]
pub struct CodecOverride {
    pub decoder: Option<Arc<dyn Decoder>>,
    pub encoder: Option<Arc<dyn Encoder>>,
}

impl CodecOverride {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.decoder.is_none() && self.encoder.is_none()
    }
}

impl fmt::Debug for CodecOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecOverride")
            .field("decoder", &self.decoder.is_some())
            .field("encoder", &self.encoder.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// PropertyCandidate

/// A member that can be written while decoding, or read while encoding.
#[derive(Clone)]
pub struct PropertyCandidate {
    name: String,
    explicit_name: bool,
    ty: TypeDescriptor,
    accessor: AccessorKind,
    set: Option<SetFn>,
    get: Option<GetFn>,
    codec: CodecOverride,
    inclusion: Option<Inclusion>,
}

impl PropertyCandidate {
    /// A member written by `set`.
    pub fn settable(
        name: impl Into<String>,
        ty: TypeDescriptor,
        accessor: AccessorKind,
        set: SetFn,
    ) -> Self {
        Self {
            name: name.into(),
            explicit_name: false,
            ty,
            accessor,
            set: Some(set),
            get: None,
            codec: CodecOverride::default(),
            inclusion: None,
        }
    }

    /// A member read by `get`.
    pub fn readable(
        name: impl Into<String>,
        ty: TypeDescriptor,
        accessor: AccessorKind,
        get: GetFn,
    ) -> Self {
        Self {
            name: name.into(),
            explicit_name: false,
            ty,
            accessor,
            set: None,
            get: Some(get),
            codec: CodecOverride::default(),
            inclusion: None,
        }
    }

    #[inline]
    pub fn with_codec(mut self, codec: CodecOverride) -> Self {
        self.codec = codec;
        self
    }

    #[inline]
    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = Some(inclusion);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the name was set explicitly and is exempt from
    /// naming strategies.
    #[inline]
    pub fn has_explicit_name(&self) -> bool {
        self.explicit_name
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    #[inline]
    pub fn accessor(&self) -> AccessorKind {
        self.accessor
    }

    #[inline]
    pub fn setter(&self) -> Option<&SetFn> {
        self.set.as_ref()
    }

    #[inline]
    pub fn getter(&self) -> Option<&GetFn> {
        self.get.as_ref()
    }

    #[inline]
    pub fn codec(&self) -> &CodecOverride {
        &self.codec
    }

    #[inline]
    pub fn inclusion(&self) -> Option<Inclusion> {
        self.inclusion
    }
}

impl fmt::Debug for PropertyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCandidate")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("accessor", &self.accessor)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Creators

/// One parameter of a creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorParam {
    name: Option<String>,
    explicit_name: bool,
    ty: TypeDescriptor,
}

impl CreatorParam {
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }
}

/// How a creator wants to be used, when stated explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CreatorMode {
    /// Inferred from arity, parameter names and types.
    #[default]
    Auto,
    /// Each parameter binds one named property.
    Properties,
    /// The single parameter receives the whole decoded value.
    Delegating,
}

/// Signature of a creator, without its body.
///
/// # Examples
///
/// ```
/// use vc_bind::introspect::{CreatorMode, CreatorSpec};
///
/// let spec = CreatorSpec::new("Point::new")
///     .param::<i32>("x")
///     .param::<i32>("y")
///     .explicit();
///
/// assert_eq!(spec.arity(), 2);
/// assert_eq!(spec.mode(), CreatorMode::Auto);
/// ```
#[derive(Debug, Clone)]
pub struct CreatorSpec {
    name: String,
    params: Vec<CreatorParam>,
    explicit: bool,
    mode: CreatorMode,
}

impl CreatorSpec {
    /// `name` identifies the creator in error messages.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            explicit: false,
            mode: CreatorMode::Auto,
        }
    }

    /// Appends a named parameter.
    #[inline]
    pub fn param<A: Typed>(self, name: impl Into<String>) -> Self {
        self.param_of(name, A::type_descriptor())
    }

    /// Appends a named parameter of an explicit type.
    pub fn param_of(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.params.push(CreatorParam {
            name: Some(name.into()),
            explicit_name: false,
            ty,
        });
        self
    }

    /// Appends an unnamed parameter.
    pub fn arg<A: Typed>(mut self) -> Self {
        self.params.push(CreatorParam {
            name: None,
            explicit_name: false,
            ty: A::type_descriptor(),
        });
        self
    }

    /// Marks the creator as explicitly chosen, like an annotation would.
    #[inline]
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    #[inline]
    pub fn properties(mut self) -> Self {
        self.mode = CreatorMode::Properties;
        self.explicit = true;
        self
    }

    #[inline]
    pub fn delegating(mut self) -> Self {
        self.mode = CreatorMode::Delegating;
        self.explicit = true;
        self
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn mode(&self) -> CreatorMode {
        self.mode
    }

    /// Attaches the body, producing a candidate.
    pub fn with_body(self, create: CreateFn) -> CreatorCandidate {
        CreatorCandidate {
            name: self.name,
            params: self.params,
            explicit: self.explicit,
            mode: self.mode,
            create,
        }
    }
}

/// A constructor or factory the creator resolver may pick.
#[derive(Clone)]
pub struct CreatorCandidate {
    name: String,
    params: Vec<CreatorParam>,
    explicit: bool,
    mode: CreatorMode,
    create: CreateFn,
}

impl CreatorCandidate {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[CreatorParam] {
        &self.params
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    #[inline]
    pub fn mode(&self) -> CreatorMode {
        self.mode
    }

    /// Invokes the creator.
    ///
    /// Failures of the body itself are reported as instantiation failures
    /// of `ty`; argument conversion errors keep their kind.
    pub fn create(&self, ty: &TypeDescriptor, values: Vec<Value>) -> Result<Object, BindError> {
        let mut args = CreatorArgs {
            ty,
            params: &self.params,
            values,
        };
        (self.create)(&mut args).map_err(|err| err.raised_by(ty))
    }
}

impl fmt::Debug for CreatorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorCandidate")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("explicit", &self.explicit)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Arguments handed to a creator body.
///
/// Missing property-based arguments have already been replaced by their
/// absent value, `null` or a primitive zero.
pub struct CreatorArgs<'a> {
    ty: &'a TypeDescriptor,
    params: &'a [CreatorParam],
    values: Vec<Value>,
}

impl CreatorArgs<'_> {
    /// The type being created.
    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.ty
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Takes argument `index` and converts it.
    ///
    /// Conversion errors are annotated with the parameter name.
    pub fn take<A: FromValue>(&mut self, index: usize) -> Result<A, BindError> {
        let Some(slot) = self.values.get_mut(index) else {
            return Err(BindError::invalid_definition(
                self.ty,
                format!("creator argument {index} is out of range"),
            ));
        };
        A::from_value(mem::take(slot)).map_err(|err| {
            match self.params.get(index).and_then(CreatorParam::name) {
                Some(name) => err.with_property(name),
                None => err,
            }
        })
    }

    /// Wraps a failure raised by the creator body.
    #[inline]
    pub fn fail(&self, cause: impl core::error::Error + Send + Sync + 'static) -> BindError {
        BindError::instantiation(self.ty, cause)
    }
}

// -----------------------------------------------------------------------------
// ClassModel

/// Everything the bean builder needs to know about one struct-like type.
///
/// A class model is the reflection-free replacement of runtime introspection:
/// a table of typed closures built once per type.
///
/// # Examples
///
/// ```
/// use vc_bind::introspect::ClassModel;
/// use vc_bind::types::TypeDescriptor;
/// use vc_bind::Typed;
///
/// #[derive(Clone, Debug, Default)]
/// struct Counter { hits: u32 }
///
/// impl Typed for Counter {
///     fn type_descriptor() -> TypeDescriptor {
///         TypeDescriptor::bean("Counter")
///     }
/// }
///
/// let model = ClassModel::builder::<Counter>()
///     .default_creator(Counter::default)
///     .field("hits", |c: &Counter| &c.hits, |c: &mut Counter, v| c.hits = v)
///     .build();
///
/// assert_eq!(model.creators().len(), 1);
/// assert_eq!(model.settable()[0].name(), "hits");
/// assert_eq!(model.readable()[0].name(), "hits");
/// ```
#[derive(Clone)]
pub struct ClassModel {
    descriptor: TypeDescriptor,
    creators: Vec<CreatorCandidate>,
    settable: Vec<PropertyCandidate>,
    readable: Vec<PropertyCandidate>,
    any_setter: Option<AnySetFn>,
    value_getter: Option<(TypeDescriptor, GetFn)>,
    ignored: Vec<String>,
    ignore_unknown: bool,
    throwable: bool,
    type_id: Option<String>,
    naming: Option<NamingStrategy>,
}

impl ClassModel {
    /// Starts a model for `T`.
    #[inline]
    pub fn builder<T>() -> ClassModelBuilder<T>
    where
        T: Typed + Any + Clone + fmt::Debug + Send + Sync,
    {
        ClassModelBuilder::new()
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn creators(&self) -> &[CreatorCandidate] {
        &self.creators
    }

    #[inline]
    pub fn settable(&self) -> &[PropertyCandidate] {
        &self.settable
    }

    #[inline]
    pub fn readable(&self) -> &[PropertyCandidate] {
        &self.readable
    }

    #[inline]
    pub fn any_setter(&self) -> Option<&AnySetFn> {
        self.any_setter.as_ref()
    }

    /// Reader of the single value instances are written as, with its type.
    ///
    /// When present, the encoder writes that value instead of an object.
    #[inline]
    pub fn value_getter(&self) -> Option<(&TypeDescriptor, &GetFn)> {
        self.value_getter.as_ref().map(|(ty, get)| (ty, get))
    }

    /// Names recognized but dropped while decoding.
    #[inline]
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    #[inline]
    pub fn ignores_unknown(&self) -> bool {
        self.ignore_unknown
    }

    /// Exception-shaped types route `message` through the creator only.
    #[inline]
    pub fn is_throwable(&self) -> bool {
        self.throwable
    }

    /// Id written for this type when it appears under an abstract declaration.
    #[inline]
    pub fn type_id(&self) -> Option<&str> {
        self.type_id.as_deref()
    }

    #[inline]
    pub fn naming(&self) -> Option<NamingStrategy> {
        self.naming
    }

    /// Renames every member without an explicit name.
    pub fn with_naming(mut self, strategy: NamingStrategy) -> Self {
        let apply = |name: &mut String, explicit: bool| {
            if !explicit {
                *name = strategy.apply(name);
            }
        };
        for property in self.settable.iter_mut().chain(self.readable.iter_mut()) {
            apply(&mut property.name, property.explicit_name);
        }
        for creator in &mut self.creators {
            for param in &mut creator.params {
                if let Some(name) = param.name.as_mut() {
                    apply(name, param.explicit_name);
                }
            }
        }
        self.naming = Some(strategy);
        self
    }
}

impl fmt::Debug for ClassModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassModel")
            .field("descriptor", &self.descriptor)
            .field("creators", &self.creators)
            .field("settable", &self.settable)
            .field("readable", &self.readable)
            .field("any_setter", &self.any_setter.is_some())
            .field("value_getter", &self.value_getter.as_ref().map(|(ty, _)| ty))
            .field("ignored", &self.ignored)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ClassModelBuilder

/// Typed builder of a [`ClassModel`].
///
/// Accessors are given as closures over `T`; the builder erases them.
pub struct ClassModelBuilder<T> {
    model: ClassModel,
    renames: Vec<(String, String)>,
    codecs: Vec<(String, CodecOverride)>,
    inclusions: Vec<(String, Inclusion)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ClassModelBuilder<T>
where
    T: Typed + Any + Clone + fmt::Debug + Send + Sync,
{
    fn new() -> Self {
        Self {
            model: ClassModel {
                descriptor: T::type_descriptor(),
                creators: Vec::new(),
                settable: Vec::new(),
                readable: Vec::new(),
                any_setter: None,
                value_getter: None,
                ignored: Vec::new(),
                ignore_unknown: false,
                throwable: false,
                type_id: None,
                naming: None,
            },
            renames: Vec::new(),
            codecs: Vec::new(),
            inclusions: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Adds a no-argument creator.
    pub fn default_creator<F>(self, create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let ty = self.model.descriptor.clone();
        let name = format!("{}::default", ty.name());
        self.creator_internal(
            CreatorSpec::new(name),
            Arc::new(move |_| Ok(Object::with_descriptor(ty.clone(), create()))),
        )
    }

    /// Adds a creator with parameters.
    pub fn creator<F>(self, spec: CreatorSpec, create: F) -> Self
    where
        F: Fn(&mut CreatorArgs<'_>) -> Result<T, BindError> + Send + Sync + 'static,
    {
        let ty = self.model.descriptor.clone();
        self.creator_internal(
            spec,
            Arc::new(move |args| Ok(Object::with_descriptor(ty.clone(), create(args)?))),
        )
    }

    fn creator_internal(mut self, spec: CreatorSpec, create: CreateFn) -> Self {
        self.model.creators.push(spec.with_body(create));
        self
    }

    fn setter_fn<V, F>(&self, set: F) -> SetFn
    where
        V: FromValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let ty = self.model.descriptor.clone();
        Arc::new(move |target, value| {
            let target = downcast_mut::<T>(target, &ty)?;
            set(target, V::from_value(value)?);
            Ok(())
        })
    }

    fn getter_fn<V, F>(&self, get: F) -> GetFn
    where
        V: ToValue,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let ty = self.model.descriptor.clone();
        Arc::new(move |target| Ok(get(downcast_ref::<T>(target, &ty)?).to_value()))
    }

    /// Adds a field, both settable and readable.
    pub fn field<V, G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        V: Typed + ToValue + FromValue + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let name = name.into();
        let ty = V::type_descriptor();
        let set = self.setter_fn(set);
        let owner = self.model.descriptor.clone();
        let get: GetFn =
            Arc::new(move |target| Ok(get(downcast_ref::<T>(target, &owner)?).to_value()));
        self.model.settable.push(PropertyCandidate::settable(
            name.clone(),
            ty.clone(),
            AccessorKind::Field,
            set,
        ));
        self.model
            .readable
            .push(PropertyCandidate::readable(name, ty, AccessorKind::Field, get));
        self
    }

    /// Adds a write-only setter.
    pub fn setter<V, S>(mut self, name: impl Into<String>, set: S) -> Self
    where
        V: Typed + FromValue + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let set = self.setter_fn(set);
        self.model.settable.push(PropertyCandidate::settable(
            name,
            V::type_descriptor(),
            AccessorKind::Setter,
            set,
        ));
        self
    }

    /// Adds a read-only getter.
    pub fn getter<V, G>(mut self, name: impl Into<String>, get: G) -> Self
    where
        V: Typed + ToValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let get = self.getter_fn(get);
        self.model.readable.push(PropertyCandidate::readable(
            name,
            V::type_descriptor(),
            AccessorKind::Getter,
            get,
        ));
        self
    }

    /// Adds a container getter that decoding merges into.
    pub fn merge_getter<V, G>(mut self, name: impl Into<String>, get: G) -> Self
    where
        V: Typed + MergeValue + 'static,
        G: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let ty = self.model.descriptor.clone();
        let merge: SetFn = Arc::new(move |target, value| {
            get(downcast_mut::<T>(target, &ty)?).merge_value(value)
        });
        self.model.settable.push(PropertyCandidate::settable(
            name,
            V::type_descriptor(),
            AccessorKind::MergeGetter,
            merge,
        ));
        self
    }

    /// Routes unknown properties to `set` instead of failing.
    pub fn any_setter<S>(mut self, set: S) -> Self
    where
        S: Fn(&mut T, &str, Value) + Send + Sync + 'static,
    {
        let ty = self.model.descriptor.clone();
        self.model.any_setter = Some(Arc::new(move |target, name, value| {
            set(downcast_mut::<T>(target, &ty)?, name, value);
            Ok(())
        }));
        self
    }

    /// Writes instances as the value `get` returns rather than as an object.
    ///
    /// Pairs with a scalar or delegating creator that takes the value back.
    pub fn value_getter<V, G>(mut self, get: G) -> Self
    where
        V: Typed + ToValue + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let get = self.getter_fn(get);
        self.model.value_getter = Some((V::type_descriptor(), get));
        self
    }

    /// Decodes the named property with `decoder`.
    pub fn with_decoder(mut self, name: impl Into<String>, decoder: Arc<dyn Decoder>) -> Self {
        self.codecs.push((
            name.into(),
            CodecOverride {
                decoder: Some(decoder),
                encoder: None,
            },
        ));
        self
    }

    /// Encodes the named property with `encoder`.
    pub fn with_encoder(mut self, name: impl Into<String>, encoder: Arc<dyn Encoder>) -> Self {
        self.codecs.push((
            name.into(),
            CodecOverride {
                decoder: None,
                encoder: Some(encoder),
            },
        ));
        self
    }

    /// Overrides the provider-wide inclusion for one property.
    pub fn include(mut self, name: impl Into<String>, inclusion: Inclusion) -> Self {
        self.inclusions.push((name.into(), inclusion));
        self
    }

    /// Gives `member` the fixed property name `property`.
    ///
    /// Applies to members and creator parameters alike.
    pub fn rename(mut self, member: impl Into<String>, property: impl Into<String>) -> Self {
        self.renames.push((member.into(), property.into()));
        self
    }

    /// Naming strategy for members without an explicit name.
    #[inline]
    pub fn naming(mut self, strategy: NamingStrategy) -> Self {
        self.model.naming = Some(strategy);
        self
    }

    /// Drops the named property silently while decoding.
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.model.ignored.push(name.into());
        self
    }

    /// Skips every unknown property of this type.
    #[inline]
    pub fn ignore_unknown(mut self) -> Self {
        self.model.ignore_unknown = true;
        self
    }

    #[inline]
    pub fn throwable(mut self) -> Self {
        self.model.throwable = true;
        self
    }

    /// Id used when this type is written under an abstract declaration.
    #[inline]
    pub fn type_id(mut self, id: impl Into<String>) -> Self {
        self.model.type_id = Some(id.into());
        self
    }

    pub fn build(self) -> ClassModel {
        let Self {
            mut model,
            renames,
            codecs,
            inclusions,
            ..
        } = self;

        for (member, property) in &renames {
            for candidate in model.settable.iter_mut().chain(model.readable.iter_mut()) {
                if candidate.name == *member {
                    candidate.name.clone_from(property);
                    candidate.explicit_name = true;
                }
            }
            for param in model.creators.iter_mut().flat_map(|c| c.params.iter_mut()) {
                if param.name.as_deref() == Some(member.as_str()) {
                    param.name = Some(property.clone());
                    param.explicit_name = true;
                }
            }
        }

        if let Some(strategy) = model.naming {
            model = model.with_naming(strategy);
        }

        // Overrides address final property names.
        for (name, codec) in codecs {
            for candidate in model.settable.iter_mut().chain(model.readable.iter_mut()) {
                if candidate.name == name {
                    if codec.decoder.is_some() {
                        candidate.codec.decoder.clone_from(&codec.decoder);
                    }
                    if codec.encoder.is_some() {
                        candidate.codec.encoder.clone_from(&codec.encoder);
                    }
                }
            }
        }
        for (name, inclusion) in inclusions {
            for candidate in &mut model.readable {
                if candidate.name == name {
                    candidate.inclusion = Some(inclusion);
                }
            }
        }

        model
    }
}

impl<T> fmt::Debug for ClassModelBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassModelBuilder")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests
