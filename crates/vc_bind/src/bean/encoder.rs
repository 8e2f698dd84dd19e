use alloc::format;
use alloc::vec::Vec;
use core::fmt;

use vc_token::TokenSink;

use crate::bean::{DelegateWriter, PropertyWriter};
use crate::codec::{CodecKind, EncodeContext, Encoder, write_type_wrapper};
use crate::config::EncodeFeatures;
use crate::error::BindError;
use crate::introspect::TypeIdStyle;
use crate::poly::TypeTag;
use crate::provider::Provider;
use crate::types::TypeDescriptor;
use crate::value::{Object, Value};

/// Encoder of a bean type: an object with one field per readable property,
/// in declaration order.
///
/// A type with a value getter is written as that single value instead, so
/// that its scalar or delegating creator can read it back.
pub struct BeanEncoder {
    pub(super) descriptor: TypeDescriptor,
    pub(super) writers: Vec<PropertyWriter>,
    pub(super) delegate: Option<DelegateWriter>,
}

impl BeanEncoder {
    #[inline]
    pub fn writers(&self) -> &[PropertyWriter] {
        &self.writers
    }

    #[inline]
    pub fn delegate(&self) -> Option<&DelegateWriter> {
        self.delegate.as_ref()
    }

    fn object<'v>(&self, value: &'v Value, ctx: &EncodeContext<'_>) -> Result<&'v Object, BindError> {
        let Some(object) = value.as_object() else {
            return Err(BindError::conversion(
                &self.descriptor,
                format!("cannot write a {} value", value.variant_name()),
            ));
        };
        if self.delegate.is_none()
            && self.writers.is_empty()
            && ctx.is_enabled(EncodeFeatures::FAIL_ON_EMPTY_BEANS)
        {
            return Err(BindError::invalid_definition(
                &self.descriptor,
                "no properties to write, disable FAIL_ON_EMPTY_BEANS to write it as `{}`",
            ));
        }
        Ok(object)
    }

    fn write_properties(
        &self,
        object: &Object,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let instance = object.as_any();
        for writer in &self.writers {
            writer.write(instance, sink, ctx)?;
        }
        Ok(())
    }
}

impl Encoder for BeanEncoder {
    #[inline]
    fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    fn kind(&self) -> CodecKind {
        CodecKind::Bean
    }

    fn encode(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
    ) -> Result<(), BindError> {
        let object = self.object(value, ctx)?;
        if let Some(delegate) = &self.delegate {
            return delegate.write(object.as_any(), sink, ctx);
        }
        sink.write_start_object()?;
        self.write_properties(object, sink, ctx)?;
        sink.write_end_object()?;
        Ok(())
    }

    /// Writes the id as the first field under [`TypeIdStyle::Property`].
    ///
    /// Types written through a value getter always use a wrapper.
    fn encode_with_type_tag(
        &self,
        value: &Value,
        sink: &mut dyn TokenSink,
        ctx: &EncodeContext<'_>,
        tag: &TypeTag,
    ) -> Result<(), BindError> {
        let (TypeIdStyle::Property(property), None) = (tag.style(), &self.delegate) else {
            return write_type_wrapper(tag, sink, |sink| self.encode(value, sink, ctx));
        };
        let object = self.object(value, ctx)?;
        sink.write_start_object()?;
        sink.write_field_name(property)?;
        sink.write_string(tag.id())?;
        self.write_properties(object, sink, ctx)?;
        sink.write_end_object()?;
        Ok(())
    }

    /// Beans are never empty.
    #[inline]
    fn is_empty(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn link(&self, provider: &Provider) -> Result<(), BindError> {
        if let Some(delegate) = &self.delegate {
            delegate.link(provider)?;
        }
        for writer in &self.writers {
            writer
                .link(provider)
                .map_err(|err| err.with_property(writer.name()))?;
        }
        Ok(())
    }
}

impl fmt::Debug for BeanEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanEncoder")
            .field("descriptor", &self.descriptor)
            .field("writers", &self.writers)
            .field("delegate", &self.delegate)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;

    use vc_token::json::JsonWriter;

    use super::*;
    use crate::config::{BindConfig, Inclusion};
    use crate::error::ErrorKind;
    use crate::introspect::{BindModel, ClassModel, ClassRegistry, CreatorSpec};
    use crate::value::Typed;

    #[derive(Clone, Debug, Default)]
    struct Parcel {
        id: i64,
        note: Option<String>,
        labels: Vec<String>,
    }

    impl Typed for Parcel {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Parcel")
        }
    }

    #[derive(Clone, Debug, Default)]
    struct Marker;

    impl Typed for Marker {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Marker")
        }
    }

    #[derive(Clone, Debug)]
    struct Code(String);

    impl Typed for Code {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::bean("Code")
        }
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.insert(BindModel::Class(
            ClassModel::builder::<Parcel>()
                .default_creator(Parcel::default)
                .field("id", |p: &Parcel| &p.id, |p: &mut Parcel, v| p.id = v)
                .field("note", |p: &Parcel| &p.note, |p: &mut Parcel, v| p.note = v)
                .field("labels", |p: &Parcel| &p.labels, |p: &mut Parcel, v| p.labels = v)
                .build(),
        ));
        registry.insert(BindModel::Class(
            ClassModel::builder::<Marker>()
                .default_creator(|| Marker)
                .build(),
        ));
        registry.insert(BindModel::Class(
            ClassModel::builder::<Code>()
                .creator(CreatorSpec::new("Code::parse").arg::<String>(), |args| {
                    Ok(Code(args.take(0)?))
                })
                .value_getter(|code: &Code| code.0.clone())
                .build(),
        ));
        registry
    }

    fn parcel() -> Value {
        Value::Object(Object::new(Parcel {
            id: 7,
            note: None,
            labels: vec![],
        }))
    }

    fn encode(provider: &Provider, value: &Value) -> Result<String, BindError> {
        let mut writer = JsonWriter::new();
        provider.encode_as(&value.runtime_descriptor(), value, &mut writer)?;
        Ok(writer.into_string()?)
    }

    fn encode_tagged(provider: &Provider, value: &Value, tag: &TypeTag) -> String {
        let encoder = provider.resolve_encoder(&value.runtime_descriptor()).unwrap();
        let mut writer = JsonWriter::new();
        encoder
            .encode_with_type_tag(value, &mut writer, &EncodeContext::new(provider), tag)
            .unwrap();
        writer.into_string().unwrap()
    }

    #[test]
    fn empty_beans() {
        let marker = Value::Object(Object::new(Marker));
        let provider = Provider::new(registry());
        let err = encode(&provider, &marker).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidDefinition { .. }));

        let provider = Provider::builder(registry())
            .config(BindConfig::default().with_encode(EncodeFeatures::FAIL_ON_EMPTY_BEANS, false))
            .build();
        assert_eq!(encode(&provider, &marker).unwrap(), "{}");
    }

    #[test]
    fn inclusion_skips_properties() {
        let provider = Provider::new(registry());
        assert_eq!(
            encode(&provider, &parcel()).unwrap(),
            r#"{"id":7,"note":null,"labels":[]}"#
        );

        let provider = Provider::builder(registry())
            .config(BindConfig::default().with_inclusion(Inclusion::NonNull))
            .build();
        assert_eq!(encode(&provider, &parcel()).unwrap(), r#"{"id":7,"labels":[]}"#);

        let provider = Provider::builder(registry())
            .config(BindConfig::default().with_inclusion(Inclusion::NonEmpty))
            .build();
        assert_eq!(encode(&provider, &parcel()).unwrap(), r#"{"id":7}"#);
    }

    #[test]
    fn type_id_comes_first() {
        let provider = Provider::new(registry());
        let tag = TypeTag::new("parcel", TypeIdStyle::Property("@type".to_string()));
        assert_eq!(
            encode_tagged(&provider, &parcel(), &tag),
            r#"{"@type":"parcel","id":7,"note":null,"labels":[]}"#
        );

        let tag = TypeTag::new("parcel", TypeIdStyle::WrapperObject);
        assert_eq!(
            encode_tagged(&provider, &parcel(), &tag),
            r#"{"parcel":{"id":7,"note":null,"labels":[]}}"#
        );
    }

    #[test]
    fn value_getter_writes_a_single_value() {
        let provider = Provider::new(registry());
        let code = Value::Object(Object::new(Code("x-1".to_string())));
        assert_eq!(encode(&provider, &code).unwrap(), r#""x-1""#);

        // Not an object, so the property style falls back to a wrapper array.
        let tag = TypeTag::new("code", TypeIdStyle::Property("@type".to_string()));
        assert_eq!(encode_tagged(&provider, &code, &tag), r#"["code","x-1"]"#);
    }
}
