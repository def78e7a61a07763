//! Chat payloads: text, id confirmation, unread counters, read receipts.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Text message delivered to this client.
///
/// `random_id` is the sender's local placeholder id. The server may add the
/// persisted id as `id`, `db_id` or both; when it does not, the placeholder
/// is the only identity the recipient ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    /// Author of the message.
    pub sender: UserId,
    /// Addressee. Absent in some server versions.
    #[serde(default)]
    pub receiver: Option<UserId>,
    /// Message body.
    pub text: String,
    /// Sender-side placeholder id.
    pub random_id: i64,
    /// Server-assigned id, when echoed.
    #[serde(default)]
    pub id: Option<i64>,
    /// Server-assigned id under its alternate key.
    #[serde(default)]
    pub db_id: Option<i64>,
    /// Display name of the author.
    #[serde(default)]
    pub sender_username: Option<String>,
}

impl TextMessage {
    /// Persisted id, preferring `id` over `db_id`.
    pub fn persisted_id(&self) -> Option<i64> {
        self.id.or(self.db_id)
    }
}

/// Server confirmation that a locally sent message was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCreated {
    /// Placeholder id the client sent with the message.
    pub random_id: i64,
    /// Persisted id.
    pub db_id: i64,
}

/// Unread counter for the conversation with `sender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Counterpart whose messages are unread.
    pub sender: UserId,
    /// New counter value. Signed on the wire; consumers clamp.
    pub unread_count: i64,
}

/// Counterpart read one of our messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadNotice {
    /// Persisted id of the message that was read.
    pub message_id: i64,
    /// Author of the message.
    #[serde(default)]
    pub sender: Option<UserId>,
    /// Reader.
    #[serde(default)]
    pub receiver: Option<UserId>,
}
