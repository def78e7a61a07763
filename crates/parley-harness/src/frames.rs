//! Server frame builders.
//!
//! Builds raw frames the way the host server writes them: flat JSON objects
//! tagged with `msg_type`, user ids as strings.

use parley_core::UserId;
use serde_json::{Value, json};

fn frame(body: Value) -> String {
    body.to_string()
}

/// Text message from `sender` to `receiver` that the server persisted as `id`.
pub fn text_message(sender: UserId, receiver: UserId, text: &str, random_id: i64, id: i64) -> String {
    frame(json!({
        "msg_type": 3,
        "sender": sender.to_string(),
        "receiver": receiver.to_string(),
        "text": text,
        "random_id": random_id,
        "id": id,
    }))
}

/// Text message relayed without a persisted id or a receiver.
pub fn relayed_text(sender: UserId, text: &str, random_id: i64) -> String {
    frame(json!({ "msg_type": 3, "sender": sender.to_string(), "text": text, "random_id": random_id }))
}

/// The server assigned `db_id` to the locally sent `random_id`.
pub fn id_created(random_id: i64, db_id: i64) -> String {
    frame(json!({ "msg_type": 8, "random_id": random_id, "db_id": db_id }))
}

/// Unread counter of the conversation with `sender`.
pub fn unread_count(sender: UserId, count: i64) -> String {
    frame(json!({ "msg_type": 9, "sender": sender.to_string(), "unread_count": count }))
}

/// `message_id` was read.
pub fn message_read(message_id: i64) -> String {
    frame(json!({ "msg_type": 6, "message_id": message_id }))
}

/// `user` went online or offline.
pub fn presence(user: UserId, online: bool) -> String {
    frame(json!({ "msg_type": if online { 1 } else { 2 }, "user_pk": user.to_string() }))
}

/// `user` started or stopped typing.
pub fn typing(user: UserId, typing: bool) -> String {
    frame(json!({ "msg_type": if typing { 5 } else { 10 }, "user_pk": user.to_string() }))
}

/// Server-side error report.
pub fn error(code: u16, text: &str) -> String {
    frame(json!({ "msg_type": 7, "error": [code, text] }))
}

/// File attachment. Decodes but is not handled.
pub fn file_message(sender: UserId) -> String {
    frame(json!({ "msg_type": 4, "sender": sender.to_string() }))
}
