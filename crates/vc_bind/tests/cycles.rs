use std::sync::Arc;
use std::thread;

use vc_bind::codec::{DecodeContext, Decoder};
use vc_bind::introspect::ClassRegistry;
use vc_bind::{Bind, FromValue, Provider, ToValue, Typed};
use vc_token::json::{self, JsonWriter};

#[derive(Bind, Clone, Debug, Default, PartialEq)]
struct Node {
    label: String,
    #[bind(rename = "self")]
    me: Option<Box<Node>>,
}

#[derive(Bind, Clone, Debug, Default, PartialEq)]
struct Parent {
    name: String,
    children: Vec<Child>,
}

#[derive(Bind, Clone, Debug, Default, PartialEq)]
struct Child {
    name: String,
    parent: Option<Box<Parent>>,
}

fn provider() -> Provider {
    let mut registry = ClassRegistry::new();
    registry.register::<Node>().register::<Parent>();
    Provider::new(registry)
}

fn to_json<T: Typed + ToValue>(provider: &Provider, value: &T) -> String {
    let mut writer = JsonWriter::new();
    provider.encode_value(value, &mut writer).unwrap();
    writer.into_string().unwrap()
}

fn from_json<T: Typed + FromValue>(provider: &Provider, text: &str) -> T {
    let mut stream = json::parse(text).unwrap();
    provider.decode_as::<T>(&mut stream).unwrap()
}

fn chain(depth: usize) -> Node {
    (0..depth).fold(Node::default(), |next, index| Node {
        label: index.to_string(),
        me: Some(Box::new(next)),
    })
}

#[test]
fn self_reference_resolves() {
    let provider = provider();
    let node: Node = from_json(&provider, r#"{"label": "root", "self": null}"#);
    assert_eq!(node.me, None);

    let node: Node = from_json(&provider, r#"{"self": {"self": {"label": "leaf"}}}"#);
    assert_eq!(node.me.unwrap().me.unwrap().label, "leaf");
}

#[test]
fn deep_chain_round_trip() {
    let provider = provider();
    let node = chain(64);
    let text = to_json(&provider, &node);
    assert!(text.starts_with(r#"{"label":"63","self":{"label":"62""#));
    assert_eq!(from_json::<Node>(&provider, &text), node);
}

#[test]
fn mutual_recursion_round_trip() {
    let provider = provider();
    let parent = Parent {
        name: "p".into(),
        children: vec![
            Child {
                name: "a".into(),
                parent: None,
            },
            Child {
                name: "b".into(),
                parent: Some(Box::new(Parent {
                    name: "q".into(),
                    children: Vec::new(),
                })),
            },
        ],
    };
    let text = to_json(&provider, &parent);
    assert_eq!(from_json::<Parent>(&provider, &text), parent);
}

#[test]
fn codecs_survive_a_flush() {
    let provider = provider();
    let before = provider.resolve_decoder(&Node::type_descriptor()).unwrap();
    assert!(Arc::ptr_eq(
        &before,
        &provider.resolve_decoder(&Node::type_descriptor()).unwrap()
    ));

    provider.flush();
    let after = provider.resolve_decoder(&Node::type_descriptor()).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));

    // Codecs held elsewhere stay usable.
    let mut stream = json::parse_started(r#"{"label": "x", "self": {"label": "y"}}"#).unwrap();
    let value = before.decode(&mut stream, &DecodeContext::new(&provider)).unwrap();
    let node = Node::from_value(value).unwrap();
    assert_eq!(node.me.unwrap().label, "y");
}

#[test]
fn concurrent_resolution_shares_codecs() {
    let provider = provider();
    let node = chain(8);
    let text = to_json(&provider, &node);
    provider.flush();

    let decoders: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let decoded: Node = from_json(&provider, &text);
                    assert_eq!(decoded, node);
                    assert_eq!(to_json(&provider, &decoded), text);
                    provider.resolve_decoder(&Node::type_descriptor()).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    for decoder in &decoders[1..] {
        assert!(Arc::ptr_eq(&decoders[0], decoder));
    }
}
