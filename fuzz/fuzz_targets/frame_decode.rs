//! Fuzz target for ServerFrame::decode
//!
//! Arbitrary text must decode or fail with a `ProtocolError`, never panic.
//! Frames that decode must report a discriminant consistent with their
//! `msg_type` field.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parley_proto::ServerFrame;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(frame) = ServerFrame::decode(raw) {
        if let Some(msg_type) = frame.msg_type() {
            let value: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert_eq!(value["msg_type"].as_u64(), Some(u64::from(msg_type.code())));
        }
    }
});
