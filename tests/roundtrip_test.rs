use chrono::DateTime;
use proptest::collection::vec;
use proptest::prelude::*;
use tinybson::{
    deserialize, doc, document_size, serialize, Document, ObjectId, Regex, UtcTimestamp, Uuid,
    Value,
};

fn arb_key() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_äöü€]{0,8}"
}

/// Values that survive `serialize` + `deserialize(.., true)` unchanged.
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        any::<f64>()
            .prop_filter("NaN never compares equal", |f| !f.is_nan())
            .prop_map(Value::Double),
        "\\PC{0,16}".prop_map(Value::String),
        vec(any::<u8>(), 0..32).prop_map(Value::Binary),
        any::<[u8; 8]>().prop_map(|b| Value::UtcDateTime(UtcTimestamp::new(b))),
        any::<[u8; 16]>().prop_map(|b| Value::Uuid(Uuid::new(b))),
        any::<[u8; 12]>().prop_map(|b| Value::ObjectId(ObjectId::new(b))),
        ("[a-z.*^$+?]{0,8}", any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(pattern, global, ignore_case, multiline)| {
                Value::Regex(Regex {
                    pattern,
                    global,
                    ignore_case,
                    multiline,
                })
            }
        ),
    ]
}

fn arb_tree(leaf: BoxedStrategy<Value>) -> impl Strategy<Value = Value> {
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..8).prop_map(Value::Array),
            vec((arb_key(), inner), 0..8)
                .prop_map(|pairs| Value::Document(pairs.into_iter().collect::<Document>())),
        ]
    })
}

fn arb_document(leaf: BoxedStrategy<Value>) -> impl Strategy<Value = Value> {
    vec((arb_key(), arb_tree(leaf)), 0..8)
        .prop_map(|pairs| Value::Document(pairs.into_iter().collect::<Document>()))
}

proptest! {
    #[test]
    fn size_parity_holds(
        value in arb_document(prop_oneof![
            4 => arb_leaf(),
            1 => Just(Value::Unsupported),
            1 => (-8_000_000_000_000i64..8_000_000_000_000)
                .prop_map(|ms| Value::DateTime(DateTime::from_timestamp_millis(ms).unwrap())),
        ].boxed())
    ) {
        let bytes = serialize(&value).unwrap();
        prop_assert_eq!(bytes.len(), document_size(&value));
        let prefix = (bytes.len() as i32).to_le_bytes();
        prop_assert_eq!(&bytes[..4], &prefix[..]);
        prop_assert_eq!(bytes[bytes.len() - 1], 0);
    }

    #[test]
    fn round_trip(value in arb_document(arb_leaf().boxed())) {
        let bytes = serialize(&value).unwrap();
        let decoded = deserialize(&bytes, true).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn calendar_dates_round_trip(ms in -8_000_000_000_000i64..8_000_000_000_000) {
        let value = Value::Document(doc! { "d" => DateTime::from_timestamp_millis(ms).unwrap() });
        let bytes = serialize(&value).unwrap();
        prop_assert_eq!(deserialize(&bytes, false).unwrap(), value);
    }

    #[test]
    fn integer_routing_matches_payload_size(n in any::<i64>()) {
        let value = Value::Document(doc! { "n" => n });
        let bytes = serialize(&value).unwrap();
        let fits = (-2_147_483_647..=2_147_483_647).contains(&n);
        // prefix + tag + "n\0" + payload + terminator
        prop_assert_eq!(bytes.len(), 4 + 1 + 2 + if fits { 4 } else { 8 } + 1);
        let decoded = deserialize(&bytes, false).unwrap();
        let read_back = decoded.as_document().and_then(|d| d.get("n")).and_then(Value::as_i64);
        prop_assert_eq!(read_back, Some(n));
    }

    #[test]
    fn garbage_never_panics(bytes in vec(any::<u8>(), 0..64)) {
        let _ = deserialize(&bytes, false);
    }
}

#[test]
fn test_unsupported_values_are_dropped() {
    let value = Value::Document(doc! {
        "keep" => 1,
        "drop" => Value::Unsupported,
        "arr" => vec![Value::from(1), Value::Unsupported, Value::from(2)],
    });
    let bytes = serialize(&value).unwrap();
    assert_eq!(bytes.len(), document_size(&value));
    let decoded = deserialize(&bytes, false).unwrap();
    assert_eq!(
        decoded,
        Value::Document(doc! {
            "keep" => 1,
            "arr" => vec![Value::from(1), Value::from(2)],
        })
    );
}

#[test]
fn test_nested_arrays_preserve_order() {
    let value = Value::Document(doc! {
        "outer" => doc! {
            "grid" => vec![
                Value::Array(vec![Value::from("a"), Value::Array(vec![Value::from(1), Value::from(2)])]),
                Value::Array(vec![]),
                Value::Array(vec![Value::from(3.5), Value::Null, Value::from(true)]),
            ],
        },
    });
    let bytes = serialize(&value).unwrap();
    assert_eq!(deserialize(&bytes, false).unwrap(), value);
}

#[test]
fn test_arrays_with_multi_digit_indices() {
    let items: Vec<Value> = (0..120).map(Value::from).collect();
    let value = Value::Document(doc! { "items" => items });
    let bytes = serialize(&value).unwrap();
    assert_eq!(bytes.len(), document_size(&value));
    assert_eq!(deserialize(&bytes, false).unwrap(), value);
}
