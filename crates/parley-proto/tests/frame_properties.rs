//! Property-based tests for frame decoding and encoding.
//!
//! The decoder sits on an untrusted boundary: it must never panic, must treat
//! unknown discriminants as forward-compatible no-ops, and must accept the
//! frames this client itself produces.

use parley_proto::{ClientFrame, MsgType, ProtocolError, ServerFrame, UserId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_decode_never_panics(raw in ".{0,256}") {
        let _ = ServerFrame::decode(&raw);
    }

    #[test]
    fn prop_decode_never_panics_on_json_objects(
        code in any::<i64>(),
        key in "[a-z_]{1,12}",
        text in ".{0,32}",
    ) {
        let mut object = serde_json::Map::new();
        object.insert("msg_type".to_string(), code.into());
        object.insert(key, text.into());
        let _ = ServerFrame::decode(&serde_json::Value::Object(object).to_string());
    }

    #[test]
    fn prop_unknown_codes_decode_to_unknown(code in 11u64..u64::MAX) {
        let raw = format!(r#"{{"msg_type":{code},"payload":{{"x":1}}}}"#);
        prop_assert_eq!(ServerFrame::decode(&raw), Ok(ServerFrame::Unknown(code)));
    }

    #[test]
    fn prop_outbound_text_is_readable_as_inbound(
        user in any::<u64>(),
        text in ".{0,64}",
        random_id in i64::MIN..0i64,
    ) {
        let frame = ClientFrame::TextMessage { user_pk: UserId(user), text: text.clone(), random_id };
        let encoded = frame.encode().expect("encode should succeed");

        // The server relays the same fields with `sender` added; emulate that.
        let mut value: serde_json::Value = serde_json::from_str(&encoded).expect("valid json");
        value["sender"] = value["user_pk"].clone();
        let decoded = ServerFrame::decode(&value.to_string()).expect("decode should succeed");

        let ServerFrame::TextMessage(inbound) = decoded else {
            return Err(TestCaseError::fail("expected TextMessage"));
        };
        prop_assert_eq!(inbound.sender, UserId(user));
        prop_assert_eq!(inbound.text, text);
        prop_assert_eq!(inbound.random_id, random_id);
    }
}

#[test]
fn negative_msg_type_is_invalid() {
    assert!(matches!(ServerFrame::decode(r#"{"msg_type":-1}"#), Err(ProtocolError::InvalidMsgType(_))));
}

#[test]
fn every_known_code_with_empty_body_is_either_decoded_or_rejected_by_payload() {
    for msg_type in MsgType::ALL {
        let raw = format!(r#"{{"msg_type":{}}}"#, msg_type.code());
        match ServerFrame::decode(&raw) {
            Ok(frame) => assert_eq!(frame.msg_type(), Some(msg_type)),
            Err(ProtocolError::InvalidPayload { msg_type: reported, .. }) => {
                assert_eq!(reported, msg_type);
            },
            Err(other) => panic!("unexpected error for {msg_type:?}: {other}"),
        }
    }
}
