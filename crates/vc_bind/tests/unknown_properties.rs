use std::sync::{Arc, Mutex};

use vc_bind::config::DecodeFeatures;
use vc_bind::error::{BindError, ErrorKind};
use vc_bind::introspect::ClassRegistry;
use vc_bind::{Bind, BindConfig, FromValue, Module, Provider, Typed};
use vc_token::TokenStream;
use vc_token::json;

const INPUT: &str = r#"{"a": 1, "bogus": [1, 2, 3], "b": 2}"#;

#[derive(Bind, Clone, Debug, Default, PartialEq)]
struct Pair {
    a: i32,
    b: i32,
}

#[derive(Bind, Clone, Debug, Default, PartialEq)]
#[bind(ignore_unknown)]
struct Lenient {
    a: i32,
    b: i32,
}

#[derive(Bind, Clone, Debug, Default, PartialEq)]
#[bind(ignore = "bogus")]
struct Picky {
    a: i32,
    b: i32,
}

#[derive(Bind, Clone, Debug, PartialEq)]
#[bind(creator = "properties")]
struct Fixed {
    a: i32,
    b: i32,
}

fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register::<Pair>()
        .register::<Lenient>()
        .register::<Picky>()
        .register::<Fixed>();
    registry
}

fn decode<T: Typed + FromValue>(provider: &Provider, text: &str) -> Result<T, BindError> {
    let mut stream = json::parse(text).unwrap();
    provider.decode_as::<T>(&mut stream)
}

#[test]
fn rejected_by_default() {
    let provider = Provider::new(registry());
    let err = decode::<Pair>(&provider, INPUT).unwrap_err();
    let ErrorKind::UnrecognizedProperty { name, ty, known } = err.kind() else {
        panic!("unexpected error {err}");
    };
    assert_eq!(name, "bogus");
    assert_eq!(ty, &Pair::type_descriptor());
    assert_eq!(known, &["a", "b"]);
    assert_eq!(err.path_string(), "$.bogus");
}

#[test]
fn skipped_when_the_feature_is_off() {
    let provider = Provider::builder(registry())
        .config(BindConfig::default().with_decode(DecodeFeatures::FAIL_ON_UNKNOWN_PROPERTIES, false))
        .build();
    assert_eq!(decode::<Pair>(&provider, INPUT).unwrap(), Pair { a: 1, b: 2 });
    assert_eq!(decode::<Fixed>(&provider, INPUT).unwrap(), Fixed { a: 1, b: 2 });
}

#[test]
fn skipped_by_type_settings() {
    let provider = Provider::new(registry());
    assert_eq!(decode::<Lenient>(&provider, INPUT).unwrap(), Lenient { a: 1, b: 2 });
    assert_eq!(decode::<Picky>(&provider, INPUT).unwrap(), Picky { a: 1, b: 2 });

    // Only the listed name is ignorable.
    let err = decode::<Picky>(&provider, r#"{"a": 1, "other": {}}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnrecognizedProperty { .. }));
}

#[test]
fn offered_to_module_handlers() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let module = Module::new("extensions").with_unknown_property_handler(
        move |ty, name: &str, stream: &mut dyn TokenStream, _ctx| {
            recorded.lock().unwrap().push(format!("{ty}.{name}"));
            if !name.starts_with("x-") {
                return Ok(false);
            }
            stream.skip_children()?;
            Ok(true)
        },
    );
    let provider = Provider::builder(registry()).module(module).build();

    let text = r#"{"x-trace": {"id": [1, 2]}, "a": 3, "b": 4}"#;
    assert_eq!(decode::<Fixed>(&provider, text).unwrap(), Fixed { a: 3, b: 4 });
    assert_eq!(decode::<Pair>(&provider, text).unwrap(), Pair { a: 3, b: 4 });

    let err = decode::<Pair>(&provider, INPUT).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnrecognizedProperty { .. }));
    assert_eq!(
        *seen.lock().unwrap(),
        ["Fixed.x-trace", "Pair.x-trace", "Pair.bogus"]
    );
}

#[test]
fn ignored_names_never_reach_handlers() {
    let module = Module::new("strict").with_unknown_property_handler(|_, name: &str, _: &mut dyn TokenStream, _| {
        Err(BindError::custom(format!("`{name}` is not allowed")))
    });
    let provider = Provider::builder(registry()).module(module).build();
    assert!(decode::<Picky>(&provider, INPUT).is_ok());
    let err = decode::<Lenient>(&provider, INPUT).unwrap_err();
    assert_eq!(err.to_string(), "`bogus` is not allowed (at $.bogus)");
}
