use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vc_token::json::{self, JsonWriter};
use vc_token::{ChainedStream, TokenBuffer, TokenKind, TokenSink, TokenStream};

fn json_tree() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn tokens_survive_a_text_round_trip(tree in json_tree()) {
        let mut writer = JsonWriter::new();
        json::write_value(&tree, &mut writer).unwrap();
        let text = writer.into_string().unwrap();

        let mut stream = json::parse_started(&text).unwrap();
        let read = json::read_value(&mut stream).unwrap();
        prop_assert_eq!(read, tree);
        prop_assert_eq!(stream.next_token().unwrap(), None);
    }

    #[test]
    fn skip_children_lands_on_the_sibling(tree in json_tree()) {
        let text = format!(r#"[{tree}, "after"]"#);
        let mut stream = json::parse_started(&text).unwrap();
        stream.expect_next().unwrap();
        stream.skip_children().unwrap();
        prop_assert_eq!(stream.next_token().unwrap(), Some(TokenKind::ValueString));
        prop_assert_eq!(stream.text().unwrap(), "after");
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    id: u32,
    tags: Vec<String>,
    parent: Option<Box<Sample>>,
}

#[test]
fn serde_bridge_round_trip() {
    let sample = Sample {
        id: 3,
        tags: vec!["x".into(), "y".into()],
        parent: Some(Box::new(Sample {
            id: 1,
            tags: Vec::new(),
            parent: None,
        })),
    };

    let mut buffer = TokenBuffer::new();
    json::serialize_into(&sample, &mut buffer).unwrap();
    assert!(buffer.is_balanced());

    let mut stream = buffer.into_stream();
    stream.expect_next().unwrap();
    let back: Sample = json::deserialize_from(&mut stream).unwrap();
    assert_eq!(back, sample);
}

#[test]
fn chained_stream_replays_buffered_fields_first() {
    let mut live = json::parse_started(r#"{"kind":"circle","r":2}"#).unwrap();
    assert_eq!(live.expect_next().unwrap(), TokenKind::FieldName);

    // Consume the type id and leave the live stream on its value.
    live.expect_next().unwrap();
    assert_eq!(live.text().unwrap(), "circle");

    let mut head = TokenBuffer::new();
    head.write_start_object().unwrap();

    let mut chained = ChainedStream::new(head, &mut live).unwrap();
    let tree = json::read_value(&mut chained).unwrap();
    assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"r":2}"#);
}
