use pretty_assertions::assert_eq;

use super::{CodecError, CommandMessage, MessageCodec};

#[test]
fn parse_well_formed_command() {
    let codec = MessageCodec::default();
    let msg = codec
        .parse(br#"{"type":"NEC","code":"20DF40BF"}"#)
        .unwrap();
    assert_eq!(msg, CommandMessage::new("NEC", "20DF40BF"));
    assert!(msg.is_complete());
}

#[test]
fn parse_tolerates_missing_fields() {
    let codec = MessageCodec::default();

    let msg = codec.parse(br#"{"type":"NEC"}"#).unwrap();
    assert_eq!(msg.code, "");
    assert!(!msg.is_complete());

    let msg = codec.parse(br#"{}"#).unwrap();
    assert!(!msg.is_complete());
}

#[test]
fn parse_ignores_extra_fields() {
    let codec = MessageCodec::default();
    let msg = codec
        .parse(br#"{"type":"NEC","code":"1A","origin":"remote"}"#)
        .unwrap();
    assert_eq!(msg, CommandMessage::new("NEC", "1A"));
}

#[test]
fn parse_rejects_malformed_payloads() {
    let codec = MessageCodec::default();
    for payload in [
        &b"{\"type\":\"NEC\",\"code\""[..], // truncated
        &b"volup"[..],                      // not JSON
        &b"[1,2,3]"[..],                    // wrong structure
        &b"\xff\xfe"[..],                   // not UTF-8
    ] {
        assert!(matches!(
            codec.parse(payload),
            Err(CodecError::Malformed(_))
        ));
    }
}

#[test]
fn parse_rejects_oversized_payloads() {
    let codec = MessageCodec::new(200);
    let huge = format!(r#"{{"type":"NEC","code":"{}"}}"#, "A".repeat(400));
    match codec.parse(huge.as_bytes()) {
        Err(CodecError::Oversized { len, limit }) => {
            assert_eq!(len, huge.len());
            assert_eq!(limit, 200);
        }
        other => panic!("expected oversized error, got {:?}", other),
    }
}

#[test]
fn serialize_renders_two_field_object() {
    let codec = MessageCodec::default();
    let bytes = codec
        .serialize(&CommandMessage::new("NEC", "12345678"))
        .unwrap();
    assert_eq!(bytes, br#"{"type":"NEC","code":"12345678"}"#.to_vec());
}

#[test]
fn serialize_parse_roundtrip() {
    let codec = MessageCodec::default();
    let original = CommandMessage::new("NEC (repeat)", "FF8D72");
    let bytes = codec.serialize(&original).unwrap();
    assert_eq!(codec.parse(&bytes).unwrap(), original);
}
