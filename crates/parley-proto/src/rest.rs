//! Records returned by the host's chat HTTP endpoints.
//!
//! These are wire shapes only. Conversion into domain types happens in
//! `parley-core`.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based page number.
    pub page: u32,
    /// Total number of pages.
    pub pages: u32,
    /// Records on this page.
    pub data: Vec<T>,
}

/// A persisted chat message.
///
/// Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Persisted id.
    pub id: i64,
    /// Message body.
    pub text: String,
    /// Creation time.
    pub sent: i64,
    /// Last modification time.
    pub edited: i64,
    /// Whether the recipient has read it.
    pub read: bool,
    /// Author.
    pub sender: UserId,
    /// Addressee.
    pub recipient: UserId,
    /// Whether the requesting user is the author.
    pub out: bool,
    /// Display name of the author.
    #[serde(default)]
    pub sender_username: Option<String>,
}

/// A conversation of the requesting user with one counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRecord {
    /// Persisted dialog id.
    pub id: i64,
    /// Creation time.
    pub created: i64,
    /// Last modification time.
    pub modified: i64,
    /// The counterpart.
    pub other_user_id: UserId,
    /// Unread messages from the counterpart.
    pub unread_count: i64,
    /// Display name of the counterpart.
    pub username: String,
    /// Most recent message in either direction.
    #[serde(default)]
    pub last_message: Option<MessageRecord>,
}

/// A user the requesting user may chat with, or the requesting user itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Primary key.
    pub pk: UserId,
    /// Display name.
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_dialog_page_without_last_message() {
        let raw = r#"{"page":1,"pages":1,"data":[
            {"id":3,"created":10,"modified":12,"other_user_id":"5","unread_count":2,
             "username":"ana","last_message":null}
        ]}"#;
        let page: Page<DialogRecord> = serde_json::from_str(raw).unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].other_user_id, UserId(5));
        assert!(page.data[0].last_message.is_none());
    }

    #[test]
    fn decodes_message_record() {
        let raw = r#"{"id":9,"text":"hey","sent":100,"edited":100,"read":false,
            "sender":"1","recipient":"5","out":true,"sender_username":"me"}"#;
        let record: MessageRecord = serde_json::from_str(raw).unwrap();

        assert!(record.out);
        assert_eq!(record.recipient, UserId(5));
    }
}
