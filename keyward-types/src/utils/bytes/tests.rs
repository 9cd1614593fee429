use std::collections::HashMap;

use super::*;

#[test]
fn deserialize_many_formats_into_bytes() {
    let json = r#"{
        "array": [101,195,212,161,191,112,75,189,152,52,121,17,62,113,114,164],
        "base64url": "ZcPUob9wS72YNHkRPnFypA",
        "base64": "ZcPUob9wS72YNHkRPnFypA=="
    }"#;

    let deserialized: HashMap<&str, Bytes> =
        serde_json::from_str(json).expect("failed to deserialize");

    assert_eq!(deserialized["array"], deserialized["base64url"]);
    assert_eq!(deserialized["base64url"], deserialized["base64"]);
}

#[test]
fn serializes_as_base64url_string_in_json() {
    let bytes = Bytes::from(vec![0xfb, 0xff, 0x01]);
    let json = serde_json::to_string(&bytes).expect("failed to serialize");
    assert_eq!(json, r#""-_8B""#);
}

#[test]
fn serializes_as_byte_string_in_cbor() {
    let bytes = Bytes::from(vec![0x01, 0x02]);
    let mut out = Vec::new();
    ciborium::ser::into_writer(&bytes, &mut out).expect("failed to serialize");
    // major type 2 (byte string) of length 2
    assert_eq!(out, [0x42, 0x01, 0x02]);

    let back: Bytes = ciborium::de::from_reader(out.as_slice()).expect("failed to deserialize");
    assert_eq!(back, bytes);
}

#[test]
fn deserialization_should_fail() {
    let json = r#"{
        "array": ["ZcPUob9wS72YNHkRPnFypA","ZcPUob9wS72YNHkRPnFypA=="],
    }"#;

    serde_json::from_str::<HashMap<&str, Bytes>>(json)
        .expect_err("did not give an error as expected.");
}
