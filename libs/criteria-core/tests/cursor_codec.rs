use criteria_core::{
    base64_url, parse_sort, CursorCodec, CursorFault, DynRecord, Error, FieldSchema, FieldSpec,
    Nav, Record, SortSpec, Value,
};
use proptest::prelude::*;
use uuid::Uuid;

fn schema() -> FieldSchema {
    FieldSchema::builder("tag")
        .field("id", FieldSpec::uuid().sortable())
        .field("name", FieldSpec::string().sortable().searchable())
        .field("weight", FieldSpec::number().sortable())
        .field("color", FieldSpec::enumeration(["RED", "GREEN"]).sortable())
        .tiebreaker("id")
        .build()
        .expect("schema")
}

fn by_name() -> SortSpec {
    parse_sort(&schema(), ["asc:name"]).expect("sort")
}

fn tag(id: u128, name: &str) -> DynRecord {
    DynRecord::new()
        .with("id", Uuid::from_u128(id))
        .with("name", name)
        .with("weight", 3)
        .with("color", Value::Enum("RED".into()))
}

fn payload(token: &str) -> serde_json::Value {
    serde_json::from_slice(&base64_url::decode(token).expect("b64")).expect("json")
}

fn repack(v: &serde_json::Value) -> String {
    base64_url::encode(&serde_json::to_vec(v).expect("json"))
}

#[test]
fn token_is_url_safe_without_padding() {
    let token = CursorCodec::new()
        .encode(&tag(1, "a/b+c?"), &by_name(), Nav::Next, None)
        .unwrap();
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}

#[test]
fn payload_shape() {
    let token = CursorCodec::new()
        .encode(&tag(7, "vip"), &by_name(), Nav::Prev, Some("abc"))
        .unwrap();
    let p = payload(&token);
    assert_eq!(p["v"], 1);
    assert_eq!(p["k"][0], "vip");
    assert_eq!(p["k"][1], Uuid::from_u128(7).to_string());
    assert_eq!(p["s"], "+name,+id");
    assert_eq!(p["n"], "prev");
    assert_eq!(p["f"], "abc");
    assert_eq!(p["h"].as_str().map(str::len), Some(16));
}

#[test]
fn malformed_tokens() {
    let codec = CursorCodec::new();
    let sort = by_name();
    assert_eq!(
        codec.decode("not base64!", &sort, None),
        Err(Error::InvalidCursor(CursorFault::Base64))
    );
    assert_eq!(
        codec.decode(&base64_url::encode(b"not json"), &sort, None),
        Err(Error::InvalidCursor(CursorFault::Json))
    );

    let mut p = payload(&codec.encode(&tag(1, "a"), &sort, Nav::Next, None).unwrap());
    p["v"] = serde_json::json!(2);
    assert_eq!(
        codec.decode(&repack(&p), &sort, None),
        Err(Error::InvalidCursor(CursorFault::Version))
    );
}

#[test]
fn tampered_keys_fail_the_checksum() {
    let codec = CursorCodec::with_secret("k1");
    let sort = by_name();
    let mut p = payload(&codec.encode(&tag(1, "alpha"), &sort, Nav::Next, None).unwrap());
    p["k"][0] = serde_json::json!("omega");
    assert_eq!(
        codec.decode(&repack(&p), &sort, None),
        Err(Error::InvalidCursor(CursorFault::Checksum))
    );
}

#[test]
fn secret_is_part_of_the_checksum() {
    let sort = by_name();
    let token = CursorCodec::with_secret("k1")
        .encode(&tag(1, "alpha"), &sort, Nav::Next, None)
        .unwrap();
    assert_eq!(
        CursorCodec::with_secret("k2").decode(&token, &sort, None),
        Err(Error::InvalidCursor(CursorFault::Checksum))
    );
    assert!(CursorCodec::with_secret("k1").decode(&token, &sort, None).is_ok());
}

#[test]
fn missing_sort_values_travel_as_null() {
    let codec = CursorCodec::with_secret("k1");
    let sort = by_name();
    let row = DynRecord::new().with("id", Uuid::from_u128(1));

    let token = codec.encode(&row, &sort, Nav::Next, None).unwrap();
    let p = payload(&token);
    assert!(p["k"][0].is_null());

    let pos = codec.decode(&token, &sort, None).unwrap();
    assert_eq!(pos.leading(), None);
    assert_eq!(pos.tie_break(), Some(&Value::Uuid(Uuid::from_u128(1))));
}

#[test]
fn null_and_empty_string_keys_sign_differently() {
    let codec = CursorCodec::with_secret("k1");
    let sort = by_name();
    let mut p = payload(&codec.encode(&tag(1, ""), &sort, Nav::Next, None).unwrap());
    p["k"][0] = serde_json::Value::Null;
    assert_eq!(
        codec.decode(&repack(&p), &sort, None),
        Err(Error::InvalidCursor(CursorFault::Checksum))
    );
}

#[test]
fn rows_without_a_tiebreaker_cannot_be_encoded() {
    let row = DynRecord::new().with("name", "alpha");
    let err = CursorCodec::new()
        .encode(&row, &by_name(), Nav::Next, None)
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnencodableRow {
            field: "id".into(),
            reason: "is null"
        }
    );
    assert!(!err.is_client_error());
}

#[test]
fn enum_and_number_keys_decode_typed() {
    let sort = parse_sort(&schema(), ["desc:color", "asc:weight"]).unwrap();
    let codec = CursorCodec::new();
    let row = tag(9, "x");
    let pos = codec
        .decode(
            &codec.encode(&row, &sort, Nav::Next, None).unwrap(),
            &sort,
            None,
        )
        .unwrap();
    assert_eq!(pos.keys()[0], Some(Value::Enum("RED".into())));
    assert_eq!(pos.keys()[1], row.field_value("weight"));
    assert_eq!(pos.tie_break(), Some(&Value::Uuid(Uuid::from_u128(9))));
}

proptest! {
    #[test]
    fn decode_inverts_encode(name in "\\PC{0,24}", weight in any::<i64>(), id in any::<u128>()) {
        let sort = parse_sort(&schema(), ["desc:weight", "asc:name"]).unwrap();
        let row = DynRecord::new()
            .with("id", Uuid::from_u128(id))
            .with("name", name.as_str())
            .with("weight", weight);
        let codec = CursorCodec::with_secret("prop");
        let token = codec.encode(&row, &sort, Nav::Next, Some("f")).unwrap();
        let pos = codec.decode(&token, &sort, Some("f")).unwrap();
        prop_assert_eq!(pos.leading().cloned(), row.field_value("weight"));
        prop_assert_eq!(pos.keys()[1].clone(), row.field_value("name"));
        prop_assert_eq!(pos.tie_break().cloned(), row.field_value("id"));
    }
}
