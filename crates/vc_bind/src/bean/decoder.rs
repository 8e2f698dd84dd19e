use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use vc_token::{Token, TokenKind, TokenStream};

use crate::bean::{Buffered, CreatorStrategy, Creators, PropertyDescriptor, PropertyValueBuffer};
use crate::codec::{CodecKind, DecodeContext, Decoder, LinkedCodec, decode_nullable};
use crate::config::DecodeFeatures;
use crate::error::{BindError, ErrorKind};
use crate::hash::{HashMap, HashSet};
use crate::introspect::{AnySetFn, CreatorCandidate};
use crate::provider::Provider;
use crate::types::TypeDescriptor;
use crate::value::{Object, Value};

/// Where a decoded unknown property goes.
enum Target<'a> {
    Instance(&'a mut Object),
    Buffer(&'a mut PropertyValueBuffer),
}

/// Decoder of a bean type.
///
/// Objects are read field by field:
///
/// ```text
/// StartObject → ExpectFieldOrEnd ─┬─ FieldName → ReadValue(prop) → ExpectFieldOrEnd
///                                 └─ EndObject → Done
/// ```
///
/// How the instance comes to exist depends on the [`CreatorStrategy`]:
///
/// - default: created up front, every property is assigned as it arrives;
/// - property-based: creator arguments are collected in a
///   [`PropertyValueBuffer`] together with any other property seen before
///   the last argument. The instance is created as soon as the last argument
///   arrives, the buffered properties are replayed in arrival order, and the
///   rest of the object is assigned directly. Arguments missing at the end
///   of the object take their decoder's absent value;
/// - delegating: the whole value is decoded as the intermediate type and
///   handed to the creator;
/// - scalar: string, number and boolean tokens go to the matching
///   single-argument creator.
///
/// Unknown properties go to the any-setter, else are dropped when listed as
/// ignorable, else are offered to the module's unknown-property handlers,
/// else are skipped or rejected depending on the class and on
/// `FAIL_ON_UNKNOWN_PROPERTIES`.
pub struct BeanDecoder {
    pub(super) descriptor: TypeDescriptor,
    pub(super) creators: Creators,
    pub(super) properties: Vec<PropertyDescriptor>,
    pub(super) by_name: HashMap<String, usize>,
    /// Property index of each creator argument.
    pub(super) creator_args: Vec<usize>,
    pub(super) any_setter: Option<AnySetFn>,
    pub(super) any_value: LinkedCodec<dyn Decoder>,
    pub(super) ignored: HashSet<String>,
    pub(super) ignore_unknown: bool,
    pub(super) delegate: Option<LinkedCodec<dyn Decoder>>,
}

impl BeanDecoder {
    #[inline]
    pub fn creators(&self) -> &Creators {
        &self.creators
    }

    #[inline]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.by_name.get(name).map(|&index| &self.properties[index])
    }

    fn unexpected(&self, expected: &'static str, found: Option<TokenKind>) -> BindError {
        BindError::unexpected_token(&self.descriptor, expected, found)
    }

    fn create(&self, creator: &CreatorCandidate, args: Vec<Value>) -> Result<Object, BindError> {
        creator.create(&self.descriptor, args)
    }

    /// Advances to the next field name; `false` at the end of the object.
    fn next_field(&self, stream: &mut dyn TokenStream) -> Result<bool, BindError> {
        match stream.expect_next()? {
            TokenKind::FieldName => Ok(true),
            TokenKind::EndObject => Ok(false),
            found => Err(self.unexpected("field name", Some(found))),
        }
    }

    fn decode_property(
        &self,
        property: &PropertyDescriptor,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let decoder = property.decoder(ctx.provider())?;
        decode_nullable(&*decoder, stream, ctx)
    }

    // -------------------------------------------------------------------------
    // Unknown properties

    fn handle_unknown(
        &self,
        target: Target<'_>,
        name: &str,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), BindError> {
        if let Some(any_setter) = &self.any_setter {
            let decoder = self.any_value.get(ctx.provider())?;
            let value = decode_nullable(&*decoder, stream, ctx)?;
            return match target {
                Target::Instance(object) => any_setter(object.as_any_mut(), name, value),
                Target::Buffer(buffer) => {
                    buffer.buffer_any(name, value);
                    Ok(())
                }
            };
        }

        if self.ignored.contains(name) {
            stream.skip_children()?;
            return Ok(());
        }

        for handler in ctx.provider().module().unknown_property_handlers() {
            if handler.handle(&self.descriptor, name, stream, ctx)? {
                return Ok(());
            }
        }

        if self.ignore_unknown || !ctx.is_enabled(DecodeFeatures::FAIL_ON_UNKNOWN_PROPERTIES) {
            log::trace!("skipping unknown property `{name}` of `{}`", self.descriptor);
            stream.skip_children()?;
            return Ok(());
        }

        Err(ErrorKind::UnrecognizedProperty {
            name: String::from(name),
            ty: self.descriptor.clone(),
            known: self
                .properties
                .iter()
                .map(|property| String::from(property.name()))
                .collect(),
        }
        .into())
    }

    // -------------------------------------------------------------------------
    // Default creator

    /// Reads one property into an existing instance.
    fn read_into(
        &self,
        object: &mut Object,
        name: &str,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), BindError> {
        let Some(&index) = self.by_name.get(name) else {
            return self.handle_unknown(Target::Instance(object), name, stream, ctx);
        };
        let property = &self.properties[index];
        if property.creator_index().is_some() {
            // Consumed by the creator already.
            stream.skip_children()?;
            return Ok(());
        }
        let value = self.decode_property(property, stream, ctx)?;
        property.set(object.as_any_mut(), value)
    }

    fn read_fields(
        &self,
        object: &mut Object,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), BindError> {
        while self.next_field(stream)? {
            let name = stream.text_owned()?;
            stream.expect_next()?;
            self.read_into(object, &name, stream, ctx)
                .map_err(|err| err.with_property(&name))?;
        }
        Ok(())
    }

    fn decode_with_default(
        &self,
        creator: &CreatorCandidate,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let mut object = self.create(creator, Vec::new())?;
        self.read_fields(&mut object, stream, ctx)?;
        Ok(Value::Object(object))
    }

    // -------------------------------------------------------------------------
    // Property-based creator

    /// Reads one property while the instance does not exist yet.
    ///
    /// Returns `true` when the last creator argument arrived.
    fn read_buffered(
        &self,
        buffer: &mut PropertyValueBuffer,
        name: &str,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<bool, BindError> {
        let Some(&index) = self.by_name.get(name) else {
            self.handle_unknown(Target::Buffer(buffer), name, stream, ctx)?;
            return Ok(false);
        };
        let property = &self.properties[index];
        let value = self.decode_property(property, stream, ctx)?;
        match property.creator_index() {
            Some(arg) => Ok(buffer.set_arg(arg, value)),
            None => {
                buffer.buffer_property(index, value);
                Ok(false)
            }
        }
    }

    fn absent_arg(&self, arg: usize, ctx: &DecodeContext<'_>) -> Result<Value, BindError> {
        let property = &self.properties[self.creator_args[arg]];
        let name = property.name();
        if ctx.is_enabled(DecodeFeatures::FAIL_ON_MISSING_CREATOR_PROPERTIES) {
            return Err(BindError::conversion(
                &self.descriptor,
                format!("missing creator property `{name}`"),
            ));
        }
        property
            .decoder(ctx.provider())?
            .absent_value(ctx)
            .map_err(|err| err.with_property(name))
    }

    fn replay(&self, object: &mut Object, buffered: Vec<Buffered>) -> Result<(), BindError> {
        for item in buffered {
            match item {
                Buffered::Property(index, value) => {
                    let property = &self.properties[index];
                    property
                        .set(object.as_any_mut(), value)
                        .map_err(|err| err.with_property(property.name()))?;
                }
                Buffered::Any(name, value) => {
                    if let Some(any_setter) = &self.any_setter {
                        any_setter(object.as_any_mut(), &name, value)
                            .map_err(|err| err.with_property(&name))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn create_from_buffer(
        &self,
        creator: &CreatorCandidate,
        buffer: &mut PropertyValueBuffer,
        ctx: &DecodeContext<'_>,
    ) -> Result<Object, BindError> {
        let args = buffer.take_args(|arg| self.absent_arg(arg, ctx))?;
        let mut object = self.create(creator, args)?;
        self.replay(&mut object, buffer.take_buffered())?;
        Ok(object)
    }

    fn decode_with_properties(
        &self,
        creator: &CreatorCandidate,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let mut buffer = PropertyValueBuffer::new(self.creator_args.len());
        let mut instance: Option<Object> = None;

        while self.next_field(stream)? {
            let name = stream.text_owned()?;
            stream.expect_next()?;
            let step = if let Some(object) = instance.as_mut() {
                self.read_into(object, &name, stream, ctx)
            } else {
                match self.read_buffered(&mut buffer, &name, stream, ctx) {
                    Ok(true) => self
                        .create_from_buffer(creator, &mut buffer, ctx)
                        .map(|object| instance = Some(object)),
                    Ok(false) => Ok(()),
                    Err(err) => Err(err),
                }
            };
            step.map_err(|err| err.with_property(&name))?;
        }

        let object = match (instance, self.creators.default_creator()) {
            (Some(object), _) => object,
            // Only exception-shaped types keep a default creator next to a
            // property-based one, for input without a message.
            (None, Some(default)) if buffer.missing() == self.creator_args.len() => {
                let mut object = self.create(default, Vec::new())?;
                self.replay(&mut object, buffer.take_buffered())?;
                object
            }
            (None, _) => self.create_from_buffer(creator, &mut buffer, ctx)?,
        };
        Ok(Value::Object(object))
    }

    // -------------------------------------------------------------------------
    // Delegating and scalar creators

    fn decode_delegating(
        &self,
        creator: &CreatorCandidate,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let Some(delegate) = &self.delegate else {
            return Err(BindError::invalid_definition(
                &self.descriptor,
                "delegating creator without an intermediate type",
            ));
        };
        let decoder = delegate.get(ctx.provider())?;
        let value = decode_nullable(&*decoder, stream, ctx)?;
        Ok(Value::Object(self.create(creator, vec![value])?))
    }

    fn decode_object(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        match self.creators.primary() {
            CreatorStrategy::Delegating { creator, .. } => {
                self.decode_delegating(creator, stream, ctx)
            }
            CreatorStrategy::PropertyBased { creator, .. } => {
                self.decode_with_properties(creator, stream, ctx)
            }
            CreatorStrategy::Default(_) | CreatorStrategy::FromScalar { .. } => {
                match self.creators.default_creator() {
                    Some(creator) => self.decode_with_default(creator, stream, ctx),
                    None => Err(self.unexpected("scalar value", Some(TokenKind::StartObject))),
                }
            }
        }
    }

    fn unwrap_array(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        if stream.expect_next()? == TokenKind::EndArray {
            return Err(self.unexpected("single value", Some(TokenKind::EndArray)));
        }
        let value = decode_nullable(self, stream, ctx).map_err(|err| err.with_index(0))?;
        match stream.expect_next()? {
            TokenKind::EndArray => Ok(value),
            found => Err(self.unexpected("end of single-value array", Some(found))),
        }
    }

    fn decode_scalar(
        &self,
        token: &Token,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        if let Some((creator, arg)) = self.creators.for_token(token) {
            return Ok(Value::Object(self.create(creator, vec![arg])?));
        }
        match self.creators.primary() {
            CreatorStrategy::Delegating { creator, .. } => {
                self.decode_delegating(creator, stream, ctx)
            }
            _ => Err(self.unexpected("object", Some(token.kind()))),
        }
    }
}

impl Decoder for BeanDecoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Bean
    }

    fn decode(
        &self,
        stream: &mut dyn TokenStream,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, BindError> {
        let Some(token) = stream.current().cloned() else {
            return Err(self.unexpected("object", None));
        };
        match token {
            Token::StartObject => self.decode_object(stream, ctx),
            Token::StartArray => match self.creators.primary() {
                CreatorStrategy::Delegating { creator, .. } => {
                    self.decode_delegating(creator, stream, ctx)
                }
                _ if ctx.is_enabled(DecodeFeatures::UNWRAP_SINGLE_VALUE_ARRAYS) => {
                    self.unwrap_array(stream, ctx)
                }
                _ => Err(self.unexpected("object", Some(TokenKind::StartArray))),
            },
            Token::EndObject | Token::EndArray | Token::FieldName(_) => {
                Err(self.unexpected("object", Some(token.kind())))
            }
            scalar => self.decode_scalar(&scalar, stream, ctx),
        }
    }

    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        for property in &self.properties {
            property
                .link(provider)
                .map_err(|err| err.with_property(property.name()))?;
        }
        if let Some(delegate) = &self.delegate {
            delegate.link(provider)?;
        }
        if self.any_setter.is_some() {
            self.any_value.link(provider)?;
        }
        Ok(())
    }
}

impl core::fmt::Debug for BeanDecoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BeanDecoder")
            .field("descriptor", &self.descriptor)
            .field("strategy", &self.creators.primary().name())
            .field("properties", &self.properties)
            .field("any_setter", &self.any_setter.is_some())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use vc_token::json;

    use super::*;
    use crate::config::BindConfig;
    use crate::introspect::{BindModel, ClassModel, ClassRegistry, CreatorSpec};
    use crate::value::Typed;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: i32,
        email: Option<String>,
    }

    impl Typed for Person {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Person")
        }
    }

    #[derive(Clone, Debug, Default)]
    struct Bag {
        id: i64,
        extra: Vec<(String, Value)>,
    }

    impl Typed for Bag {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Bag")
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Tag(String);

    impl Typed for Tag {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Tag")
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Path(Vec<i32>);

    impl Typed for Path {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Path")
        }
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Class(
            ClassModel::builder::<Person>()
                .creator(
                    CreatorSpec::new("Person::new")
                        .param::<String>("name")
                        .param::<i32>("age")
                        .properties(),
                    |args| {
                        Ok(Person {
                            name: args.take(0)?,
                            age: args.take(1)?,
                            email: None,
                        })
                    },
                )
                .field("email", |p: &Person| &p.email, |p: &mut Person, v| p.email = v)
                .build(),
        ));
        registry.insert(BindModel::Class(
            ClassModel::builder::<Bag>()
                .default_creator(Bag::default)
                .field("id", |b: &Bag| &b.id, |b: &mut Bag, v| b.id = v)
                .any_setter(|b: &mut Bag, name, value| b.extra.push((name.to_string(), value)))
                .build(),
        ));
        registry.insert(BindModel::Class(
            ClassModel::builder::<Tag>()
                .creator(CreatorSpec::new("Tag::from_str").arg::<String>(), |args| {
                    Ok(Tag(args.take(0)?))
                })
                .build(),
        ));
        registry.insert(BindModel::Class(
            ClassModel::builder::<Path>()
                .creator(CreatorSpec::new("Path::from_steps").arg::<Vec<i32>>(), |args| {
                    Ok(Path(args.take(0)?))
                })
                .build(),
        ));
        registry
    }

    fn decode<T: Typed + core::any::Any>(provider: &Provider, input: &str) -> Result<T, BindError> {
        let mut stream = json::parse(input).unwrap();
        let value = provider.decode(&T::type_descriptor(), &mut stream)?;
        match value {
            Value::Object(object) => Ok(object.downcast::<T>().unwrap()),
            other => panic!("expected an object, got {other:?}"),
        }
    }

    #[test]
    fn property_based_in_any_order() {
        let provider = Provider::new(registry());
        let person: Person =
            decode(&provider, r#"{"email": "a@b.c", "age": 41, "name": "Ada"}"#).unwrap();
        assert_eq!(
            person,
            Person {
                name: "Ada".into(),
                age: 41,
                email: Some("a@b.c".into()),
            }
        );

        // Fields after the last argument are assigned directly.
        let person: Person =
            decode(&provider, r#"{"name": "Bo", "age": 7, "email": null}"#).unwrap();
        assert_eq!(person.email, None);
    }

    #[test]
    fn missing_primitive_argument() {
        let provider = Provider::new(registry());
        let person: Person = decode(&provider, r#"{"name": "Cy"}"#).unwrap();
        assert_eq!(person.age, 0);

        let provider = Provider::builder(registry())
            .config(BindConfig::default().with_decode(DecodeFeatures::FAIL_ON_NULL_FOR_PRIMITIVES, true))
            .build();
        let err = decode::<Person>(&provider, r#"{"name": "Cy"}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ValueConversionFailure { .. }));

        let provider = Provider::builder(registry())
            .config(
                BindConfig::default().with_decode(DecodeFeatures::FAIL_ON_MISSING_CREATOR_PROPERTIES, true),
            )
            .build();
        let err = decode::<Person>(&provider, r#"{"age": 3}"#).unwrap_err();
        assert!(err.to_string().contains("`name`"));
    }

    #[test]
    fn any_setter_collects_unknown() {
        let provider = Provider::new(registry());
        let bag: Bag = decode(&provider, r#"{"color": "red", "id": 9, "size": [1, 2]}"#).unwrap();
        assert_eq!(bag.id, 9);
        let names: Vec<_> = bag.extra.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["color", "size"]);
        assert_eq!(bag.extra[0].1.as_str(), Some("red"));
    }

    #[test]
    fn unknown_property_is_rejected() {
        let provider = Provider::new(registry());
        let err = decode::<Person>(&provider, r#"{"name": "Di", "nick": "d", "age": 1}"#).unwrap_err();
        let ErrorKind::UnrecognizedProperty { name, known, .. } = err.kind() else {
            panic!("unexpected error {err}");
        };
        assert_eq!(name, "nick");
        assert!(known.iter().any(|known| known == "email"));
        assert_eq!(err.path_string(), "$.nick");

        let provider = Provider::builder(registry())
            .config(BindConfig::default().with_decode(DecodeFeatures::FAIL_ON_UNKNOWN_PROPERTIES, false))
            .build();
        let person: Person =
            decode(&provider, r#"{"name": "Di", "nick": {"a": [1, {}]}, "age": 1}"#).unwrap();
        assert_eq!(person.age, 1);
    }

    #[test]
    fn scalar_and_delegating_creators() {
        let provider = Provider::new(registry());
        assert_eq!(decode::<Tag>(&provider, r#""urgent""#).unwrap(), Tag("urgent".into()));
        assert!(decode::<Tag>(&provider, "12").is_err());
        assert_eq!(decode::<Path>(&provider, "[3, 1, 2]").unwrap(), Path(vec![3, 1, 2]));
    }

    #[test]
    fn single_value_arrays() {
        let provider = Provider::new(registry());
        let err = decode::<Bag>(&provider, r#"[{"id": 1}]"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedToken { .. }));

        let provider = Provider::builder(registry())
            .config(BindConfig::default().with_decode(DecodeFeatures::UNWRAP_SINGLE_VALUE_ARRAYS, true))
            .build();
        assert_eq!(decode::<Bag>(&provider, r#"[{"id": 1}]"#).unwrap().id, 1);
        assert!(decode::<Bag>(&provider, r#"[{"id": 1}, {"id": 2}]"#).is_err());
    }

    #[test]
    fn nested_errors_carry_a_path() {
        let provider = Provider::new(registry());
        let err = decode::<Person>(&provider, r#"{"name": "Ed", "age": "old"}"#).unwrap_err();
        assert_eq!(err.path_string(), "$.age");
    }
}
