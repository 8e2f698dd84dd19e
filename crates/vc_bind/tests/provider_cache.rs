use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use vc_bind::error::ErrorKind;
use vc_bind::introspect::{
    AbstractModel, BindModel, ClassModel, ClassRegistry, CreatorSpec, EnumModel, Introspector,
};
use vc_bind::types::ScalarKind;
use vc_bind::{Bind, Provider, TypeDescriptor, Typed};
use vc_token::{TokenBuffer, TokenSink, json};

/// Counts class lookups per type name.
#[derive(Default)]
struct Counting {
    inner: ClassRegistry,
    lookups: Mutex<HashMap<String, usize>>,
}

impl Counting {
    fn lookups(&self, name: &str) -> usize {
        self.lookups.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl Introspector for Counting {
    fn find_class(&self, ty: &TypeDescriptor) -> Option<Arc<ClassModel>> {
        *self.lookups.lock().unwrap().entry(ty.to_string()).or_default() += 1;
        self.inner.find_class(ty)
    }

    fn find_enum(&self, ty: &TypeDescriptor) -> Option<Arc<EnumModel>> {
        self.inner.find_enum(ty)
    }

    fn find_abstract(&self, ty: &TypeDescriptor) -> Option<Arc<AbstractModel>> {
        self.inner.find_abstract(ty)
    }

    fn find_by_name(&self, name: &str) -> Option<TypeDescriptor> {
        self.inner.find_by_name(name)
    }
}

#[derive(Clone, Debug, Default)]
struct Broken {
    value: i32,
}

impl Typed for Broken {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::bean("Broken")
    }
}

#[derive(Clone, Debug, Default)]
struct Holder {
    broken: Broken,
}

impl Typed for Holder {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::bean("Holder")
    }
}

impl vc_bind::ToValue for Broken {
    fn to_value(&self) -> vc_bind::Value {
        vc_bind::Value::Object(vc_bind::value::Object::new(self.clone()))
    }
}

impl vc_bind::FromValue for Broken {
    fn from_value(value: vc_bind::Value) -> Result<Self, vc_bind::BindError> {
        match value {
            vc_bind::Value::Object(object) => {
                object.downcast().map_err(|_| vc_bind::BindError::custom("not broken"))
            }
            _ => Err(vc_bind::BindError::custom("not broken")),
        }
    }
}

fn counting() -> Arc<Counting> {
    let mut inner = ClassRegistry::new();
    // Two property-based creators of equal standing.
    inner.insert(BindModel::Class(
        ClassModel::builder::<Broken>()
            .creator(
                CreatorSpec::new("Broken::new").param::<i32>("value").properties(),
                |args| Ok(Broken { value: args.take(0)? }),
            )
            .creator(
                CreatorSpec::new("Broken::parse").param::<i32>("value").properties(),
                |args| Ok(Broken { value: args.take(0)? }),
            )
            .build(),
    ));
    inner.insert(BindModel::Class(
        ClassModel::builder::<Holder>()
            .default_creator(Holder::default)
            .field("broken", |h: &Holder| &h.broken, |h: &mut Holder, v| h.broken = v)
            .build(),
    ));
    Arc::new(Counting {
        inner,
        lookups: Mutex::default(),
    })
}

#[test]
fn definition_failures_are_cached_until_flush() {
    let introspector = counting();
    let provider = Provider::new(introspector.clone());
    let ty = Broken::type_descriptor();

    let err = provider.resolve_decoder(&ty).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::ConflictingCreators { .. }));
    let lookups = introspector.lookups("Broken");
    assert!(lookups > 0);

    let again = provider.resolve_decoder(&ty).err().unwrap();
    assert_eq!(again.to_string(), err.to_string());
    assert_eq!(introspector.lookups("Broken"), lookups);

    provider.flush();
    assert!(provider.resolve_decoder(&ty).is_err());
    assert!(introspector.lookups("Broken") > lookups);
}

#[test]
fn dependents_of_broken_types_are_rebuilt() {
    let introspector = counting();
    let provider = Provider::new(introspector.clone());
    let ty = Holder::type_descriptor();

    let err = provider.resolve_decoder(&ty).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::ConflictingCreators { .. }));
    assert_eq!(err.path_string(), "$.broken");

    let holder = introspector.lookups("Holder");
    let broken = introspector.lookups("Broken");
    assert!(provider.resolve_decoder(&ty).is_err());
    // The holder failed while linking and is built again; its broken
    // property's failure is served from the cache.
    assert!(introspector.lookups("Holder") > holder);
    assert_eq!(introspector.lookups("Broken"), broken);

    // Encoding does not need creators.
    assert!(provider.resolve_encoder(&ty).is_ok());
}

#[test]
fn unknown_types_are_cached_failures() {
    let introspector = counting();
    let provider = Provider::new(introspector.clone());
    let ghost = TypeDescriptor::bean("Ghost");

    let err = provider.resolve_encoder(&ghost).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::NoCodecFound { .. }));
    let lookups = introspector.lookups("Ghost");
    assert!(provider.resolve_encoder(&ghost).is_err());
    assert_eq!(introspector.lookups("Ghost"), lookups);
}

#[test]
fn scalars_never_reach_the_introspector() {
    let introspector = counting();
    let provider = Provider::new(introspector.clone());
    let int = TypeDescriptor::scalar(ScalarKind::I32);
    provider.resolve_decoder(&int).unwrap();
    provider.resolve_decoder(&TypeDescriptor::list(int.clone())).unwrap();
    assert!(introspector.lookups.lock().unwrap().is_empty());
}

// -----------------------------------------------------------------------------
// Error paths

#[derive(Bind, Clone, Debug, Default, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Bind, Clone, Debug, Default, PartialEq)]
struct Route {
    name: String,
    stops: Vec<Point>,
    named: std::collections::BTreeMap<String, Point>,
}

fn route_provider() -> Provider {
    let mut registry = ClassRegistry::new();
    registry.register::<Route>();
    Provider::new(registry)
}

fn path_of(text: &str) -> String {
    let provider = route_provider();
    let mut stream = json::parse(text).unwrap();
    provider
        .decode(&Route::type_descriptor(), &mut stream)
        .unwrap_err()
        .path_string()
}

#[test]
fn errors_point_at_the_failing_value() {
    assert_eq!(path_of(r#"{"stops": [{"x": 1}, {"y": "up"}]}"#), "$.stops[1].y");
    assert_eq!(path_of(r#"{"named": {"home": {"x": true}}}"#), r#"$.named["home"].x"#);
    assert_eq!(path_of(r#"{"stops": [{"z": 0}]}"#), "$.stops[0].z");
}

#[test]
fn truncated_input_is_a_stream_error() {
    let provider = route_provider();
    let mut buffer = TokenBuffer::new();
    buffer.write_start_object().unwrap();
    buffer.write_field_name("name").unwrap();
    let mut stream = buffer.into_stream();
    let err = provider.decode(&Route::type_descriptor(), &mut stream).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Stream(_)));
}
