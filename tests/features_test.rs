#![cfg(any(feature = "uuid", feature = "serde_json"))]

#[allow(unused_imports)]
use tinybson::{deserialize, doc, serialize, Value};

#[cfg(feature = "uuid")]
#[test]
fn test_uuid_interop() {
    let external = uuid::Uuid::from_bytes([
        0x43, 0xab, 0x2e, 0x98, 0x62, 0x3c, 0x03, 0xe8, 0x5f, 0x54, 0x1a, 0x17, 0x45, 0xe0, 0x1b, 0xda,
    ]);
    let value = Value::Document(doc! { "uuid" => external });
    let bytes = serialize(&value).unwrap();
    let decoded = deserialize(&bytes, false).unwrap();
    let Some(Value::Uuid(uuid)) = decoded.as_document().and_then(|d| d.get("uuid")) else {
        panic!("expected a uuid, got {:?}", decoded);
    };
    assert_eq!(uuid::Uuid::from(*uuid), external);
}

#[cfg(feature = "serde_json")]
#[test]
fn test_from_json() {
    let json = serde_json::json!({
        "BSON": ["awesome", 5.05, 1986],
        "big": 1125899906842624i64,
        "nested": { "none": null, "ok": true },
    });
    let value = Value::from(json);
    let expected = Value::Document(doc! {
        "BSON" => vec![Value::from("awesome"), Value::from(5.05), Value::from(1986)],
        "big" => Value::Int64(1_125_899_906_842_624),
        "nested" => doc! { "none" => Value::Null, "ok" => true },
    });
    assert_eq!(value, expected);
}
