use bytes::Bytes;
use chrono::{DateTime, Utc};
use tinybson::{
    deserialize, doc, from_bson_bytes, serialize, to_bson_bytes, BsonError, FromBson, ObjectId,
    StructDecodeError, ToBson, UtcTimestamp, Value,
};

#[derive(ToBson, FromBson, Debug, PartialEq)]
struct Account {
    #[bson(rename = "_id")]
    id: ObjectId,
    name: String,
    age: i32,
    balance: i64,
    active: bool,
    score: f64,
    nickname: Option<String>,
    tags: Vec<String>,
    avatar: Bytes,
    created: UtcTimestamp,
    #[bson(default)]
    logins: u32,
    #[bson(skip)]
    cached: String,
}

#[derive(ToBson, FromBson, Debug, PartialEq)]
struct Wrapper {
    inner: Option<String>,
    items: Vec<Point>,
}

#[derive(ToBson, FromBson, Debug, PartialEq, Default)]
struct Point {
    x: i32,
    y: i32,
}

fn account() -> Account {
    Account {
        id: ObjectId::new([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]),
        name: "Alice".to_string(),
        age: 30,
        balance: 1 << 40,
        active: true,
        score: 4.5,
        nickname: None,
        tags: vec!["admin".to_string(), "ops".to_string()],
        avatar: Bytes::from_static(&[0xde, 0xad]),
        created: UtcTimestamp::from_millis(1_466_866_091_000),
        logins: 7,
        cached: String::new(),
    }
}

#[test]
fn test_struct_round_trip() {
    let original = account();
    let bytes = to_bson_bytes(&original).unwrap();
    let decoded: Account = from_bson_bytes(&bytes).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn test_field_order_and_rename() {
    let value = account().to_bson();
    let doc = value.as_document().unwrap();
    let keys: Vec<&str> = doc.keys().collect();
    assert_eq!(
        keys,
        [
            "_id", "name", "age", "balance", "active", "score", "nickname", "tags", "avatar",
            "created", "logins"
        ]
    );
    assert_eq!(doc.get("balance"), Some(&Value::Int64(1 << 40)));
    assert_eq!(doc.get("nickname"), Some(&Value::Null));
}

#[test]
fn test_skip_field_is_not_written_and_defaults_on_read() {
    let mut original = account();
    original.cached = "not persisted".to_string();
    let decoded: Account = from_bson_bytes(&to_bson_bytes(&original).unwrap()).unwrap();
    assert_eq!(decoded.cached, "");
}

#[test]
fn test_missing_optional_and_default_fields() {
    let mut value = account().to_bson();
    if let Value::Document(doc) = &mut value {
        doc.remove("nickname");
        doc.remove("logins");
    }
    let decoded = Account::from_bson(value).unwrap();
    assert_eq!(decoded.nickname, None);
    assert_eq!(decoded.logins, 0);
}

#[test]
fn test_missing_required_field() {
    let mut value = account().to_bson();
    if let Value::Document(doc) = &mut value {
        doc.remove("name");
    }
    assert!(matches!(
        Account::from_bson(value),
        Err(BsonError::StructDecode(StructDecodeError::MissingRequiredField {
            field: "name",
            struct_name: "Account",
        }))
    ));
}

#[test]
fn test_type_mismatch() {
    assert!(matches!(
        Point::from_bson(Value::from(1)),
        Err(BsonError::StructDecode(StructDecodeError::TypeMismatch {
            expected: "document",
            actual: "int32",
        }))
    ));
    let value = Value::Document(doc! { "x" => "one", "y" => 2 });
    assert!(matches!(
        Point::from_bson(value),
        Err(BsonError::StructDecode(StructDecodeError::TypeMismatch { .. }))
    ));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let value = Value::Document(doc! { "x" => 1, "extra" => "ignored", "y" => 2 });
    assert_eq!(Point::from_bson(value).unwrap(), Point { x: 1, y: 2 });
}

#[test]
fn test_nested_structs() {
    let original = Wrapper {
        inner: Some("payload".to_string()),
        items: vec![Point { x: 1, y: 2 }, Point::default()],
    };
    let bytes = to_bson_bytes(&original).unwrap();
    let decoded: Wrapper = from_bson_bytes(&bytes).unwrap();
    assert_eq!(original, decoded);
}

#[test]
fn test_calendar_dates_in_structs() {
    #[derive(ToBson, FromBson, Debug, PartialEq)]
    struct Event {
        at: DateTime<Utc>,
    }

    let event = Event {
        at: DateTime::from_timestamp_millis(1_318_258_080_000).unwrap(),
    };
    let bytes = serialize(&event.to_bson()).unwrap();
    // Either decode mode yields something the struct accepts.
    assert_eq!(Event::from_bson(deserialize(&bytes, false).unwrap()).unwrap(), event);
    assert_eq!(Event::from_bson(deserialize(&bytes, true).unwrap()).unwrap(), event);
}
