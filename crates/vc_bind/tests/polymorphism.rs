use std::sync::Arc;

use vc_bind::codec::{Encoder, MonomorphicCache};
use vc_bind::error::ErrorKind;
use vc_bind::introspect::{AbstractModel, BindModel, ClassRegistry, TypeIdStyle};
use vc_bind::{Bind, FromValue, Provider, ToValue, TypeDescriptor, Typed, Value};
use vc_token::json::{self, JsonWriter};

#[derive(Bind, Clone, Debug, Default, PartialEq)]
#[bind(type_id = "circle")]
struct Circle {
    radius: f64,
}

#[derive(Bind, Clone, Debug, Default, PartialEq)]
#[bind(type_id = "square")]
struct Square {
    side: f64,
}

fn shape() -> TypeDescriptor {
    TypeDescriptor::abstract_type("Shape")
}

fn provider(model: AbstractModel) -> Provider {
    let mut registry = ClassRegistry::new();
    registry.register::<Circle>().register::<Square>();
    registry.insert(BindModel::Abstract(model));
    Provider::new(registry)
}

fn shapes() -> Value {
    Value::List(vec![
        Circle { radius: 1.5 }.to_value(),
        Square { side: 2.0 }.to_value(),
        Circle { radius: 0.5 }.to_value(),
    ])
}

fn encode(provider: &Provider, ty: &TypeDescriptor, value: &Value) -> String {
    let mut writer = JsonWriter::new();
    provider.encode_as(ty, value, &mut writer).unwrap();
    writer.into_string().unwrap()
}

fn decode(provider: &Provider, ty: &TypeDescriptor, text: &str) -> Result<Value, vc_bind::BindError> {
    let mut stream = json::parse(text).unwrap();
    provider.decode(ty, &mut stream)
}

#[test]
fn abstract_list_round_trip() {
    let provider = provider(AbstractModel::new(shape()));
    let list = TypeDescriptor::list(shape());
    let text = encode(&provider, &list, &shapes());
    assert_eq!(
        text,
        r#"[{"@type":"circle","radius":1.5},{"@type":"square","side":2.0},{"@type":"circle","radius":0.5}]"#
    );

    let decoded = decode(&provider, &list, &text).unwrap();
    let items = decoded.as_list().unwrap();
    assert_eq!(Circle::from_value(items[0].clone()).unwrap(), Circle { radius: 1.5 });
    assert_eq!(Square::from_value(items[1].clone()).unwrap(), Square { side: 2.0 });
}

#[test]
fn id_after_fields() {
    let provider = provider(AbstractModel::new(shape()));
    let value = decode(&provider, &shape(), r#"{"side": 4, "@type": "square"}"#).unwrap();
    assert_eq!(Square::from_value(value).unwrap(), Square { side: 4.0 });
}

#[test]
fn declared_subtype_ids_win() {
    let provider = provider(
        AbstractModel::new(shape())
            .subtype_typed::<Circle>("round")
            .style(TypeIdStyle::WrapperArray),
    );
    let text = encode(&provider, &shape(), &Circle { radius: 1.0 }.to_value());
    assert_eq!(text, r#"["round",{"radius":1.0}]"#);
    assert_eq!(provider.type_tag(&shape(), &Square::type_descriptor()).unwrap().id(), "square");
    let value = decode(&provider, &shape(), &text).unwrap();
    assert_eq!(Circle::from_value(value).unwrap().radius, 1.0);
}

#[test]
fn missing_or_unknown_ids() {
    let provider = provider(AbstractModel::new(shape()));
    let err = decode(&provider, &shape(), r#"{"radius": 1}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::AbstractTypeNotInstantiable { .. }));

    let err = decode(&provider, &shape(), r#"{"@type": "hexagon"}"#).unwrap_err();
    let ErrorKind::InvalidTypeId { id, .. } = err.kind() else {
        panic!("unexpected error {err}");
    };
    assert_eq!(id, "hexagon");

    let provider = provider_with_default();
    let value = decode(&provider, &shape(), r#"{"radius": 1}"#).unwrap();
    assert_eq!(Circle::from_value(value).unwrap().radius, 1.0);
}

fn provider_with_default() -> Provider {
    provider(AbstractModel::new(shape()).with_default_impl(Circle::type_descriptor()))
}

#[test]
fn untyped_lists_write_by_runtime_type() {
    let provider = provider(AbstractModel::new(shape()));
    let text = encode(&provider, &TypeDescriptor::any(), &shapes());
    assert_eq!(text, r#"[{"radius":1.5},{"side":2.0},{"radius":0.5}]"#);
}

#[test]
fn inline_cache_follows_the_last_type() {
    let provider = provider(AbstractModel::new(shape()));
    let cache = MonomorphicCache::new();
    let circle = Circle::type_descriptor();
    let square = Square::type_descriptor();

    let first = cache.get(&circle, &provider).unwrap();
    assert!(Arc::ptr_eq(&first, &cache.get(&circle, &provider).unwrap()));
    assert_eq!(cache.cached_type(), Some(circle.clone()));

    let other = cache.get(&square, &provider).unwrap();
    assert_eq!(other.descriptor(), &square);
    assert_eq!(cache.cached_type(), Some(square.clone()));

    // Cached codecs are held weakly: after a flush the slot falls through.
    let old = Arc::downgrade(&other);
    drop((first, other));
    provider.flush();
    assert!(old.upgrade().is_none());
    let again = cache.get(&square, &provider).unwrap();
    assert_eq!(again.descriptor(), &square);
}
