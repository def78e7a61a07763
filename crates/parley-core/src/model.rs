//! Chat data model.
//!
//! Messages carry a [`MessageId`] that is either a client-generated
//! placeholder or a server-confirmed id. The two id spaces never mix: a
//! placeholder turns into a confirmed id in place, exactly once.

use std::fmt;

use parley_proto::{
    UserId,
    rest::{DialogRecord, MessageRecord, UserRecord},
};

use crate::Environment;

/// Unix seconds.
pub type Timestamp = i64;

/// Span of placeholder ids: `[-PENDING_ID_SPAN, -1]`.
pub const PENDING_ID_SPAN: u64 = 100_000_000_000;

/// Identity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Client-generated placeholder (negative), awaiting server confirmation.
    Pending(i64),
    /// Server-assigned id.
    Confirmed(i64),
}

impl MessageId {
    /// Draw a fresh placeholder id from the environment RNG.
    ///
    /// Uniqueness is best-effort. Collisions within one session are possible
    /// but unlikely given the span.
    pub fn pending<E: Environment>(env: &E) -> Self {
        let offset = env.random_u64() % PENDING_ID_SPAN;
        // offset < PENDING_ID_SPAN, which fits in i64
        Self::Pending(-(offset as i64) - 1)
    }

    /// Whether this id is still a placeholder.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The raw value, regardless of id space.
    #[must_use]
    pub const fn value(&self) -> i64 {
        match self {
            Self::Pending(v) | Self::Confirmed(v) => *v,
        }
    }

    /// Server id, if confirmed with a positive value.
    ///
    /// Incoming messages that were relayed without a persisted id fall back to
    /// the sender's placeholder, which is confirmed but not positive. Those
    /// cannot be acknowledged to the server.
    #[must_use]
    pub const fn server_id(&self) -> Option<i64> {
        match self {
            Self::Confirmed(v) if *v > 0 => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(v) => write!(f, "pending:{v}"),
            Self::Confirmed(v) => write!(f, "{v}"),
        }
    }
}

/// Whether the local user wrote the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Written by the local user.
    Outgoing,
    /// Written by the counterpart.
    Incoming,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identity, pending until the server confirms it.
    pub id: MessageId,
    /// Body.
    pub text: String,
    /// Creation time.
    pub sent_at: Timestamp,
    /// Last modification time.
    pub edited_at: Timestamp,
    /// Whether the recipient has read it.
    pub read: bool,
    /// Author.
    pub sender_id: UserId,
    /// Addressee.
    pub recipient_id: UserId,
    /// Local or remote author.
    pub direction: Direction,
    /// Display name of the author, when known.
    pub sender_username: Option<String>,
}

impl Message {
    /// Whether `user` is either party of this message.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.sender_id == user || self.recipient_id == user
    }

    /// The party that is not `local_user`.
    ///
    /// For a message a user sent to themselves both parties are the same.
    #[must_use]
    pub fn counterpart(&self, local_user: UserId) -> UserId {
        if self.sender_id == local_user { self.recipient_id } else { self.sender_id }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: MessageId::Confirmed(record.id),
            text: record.text,
            sent_at: record.sent,
            edited_at: record.edited,
            read: record.read,
            sender_id: record.sender,
            recipient_id: record.recipient,
            direction: if record.out { Direction::Outgoing } else { Direction::Incoming },
            sender_username: record.sender_username,
        }
    }
}

/// A one-on-one conversation, keyed by the counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Counterpart user.
    pub other_user_id: UserId,
    /// Counterpart display name.
    pub username: String,
    /// Text of the most recent message in either direction.
    pub last_message_preview: String,
    /// Unread messages from the counterpart.
    pub unread_count: u32,
    /// Whether the counterpart is connected.
    pub online: bool,
    /// Whether the counterpart is typing to us.
    pub typing: bool,
}

impl Conversation {
    /// New conversation with no preview and nothing unread.
    pub fn new(other_user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            other_user_id,
            username: username.into(),
            last_message_preview: String::new(),
            unread_count: 0,
            online: false,
            typing: false,
        }
    }
}

/// Clamp a signed wire counter into an unread count.
#[must_use]
pub fn clamp_unread(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

impl From<DialogRecord> for Conversation {
    fn from(record: DialogRecord) -> Self {
        Self {
            other_user_id: record.other_user_id,
            username: record.username,
            last_message_preview: record.last_message.map(|m| m.text).unwrap_or_default(),
            unread_count: clamp_unread(record.unread_count),
            online: false,
            typing: false,
        }
    }
}

/// Entry in the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub username: String,
}

impl From<UserRecord> for DirectoryUser {
    fn from(record: UserRecord) -> Self {
        Self { id: record.pk, username: record.username }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Clone)]
    struct FixedEnv(u64);

    impl Environment for FixedEnv {
        fn now(&self) -> Timestamp {
            0
        }

        async fn sleep(&self, _duration: Duration) {}

        fn random_bytes(&self, buffer: &mut [u8]) {
            let bytes = self.0.to_be_bytes();
            for (dst, src) in buffer.iter_mut().zip(bytes.iter().cycle()) {
                *dst = *src;
            }
        }
    }

    #[test]
    fn pending_ids_stay_in_range() {
        for raw in [0, 1, PENDING_ID_SPAN - 1, PENDING_ID_SPAN, u64::MAX] {
            let MessageId::Pending(v) = MessageId::pending(&FixedEnv(raw)) else {
                panic!("expected pending id");
            };
            assert!((-(PENDING_ID_SPAN as i64)..=-1).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn server_id_requires_positive_confirmed() {
        assert_eq!(MessageId::Confirmed(12).server_id(), Some(12));
        assert_eq!(MessageId::Confirmed(-12).server_id(), None);
        assert_eq!(MessageId::Pending(-12).server_id(), None);
    }

    #[test]
    fn dialog_record_clamps_negative_unread() {
        let record = DialogRecord {
            id: 1,
            created: 0,
            modified: 0,
            other_user_id: UserId(5),
            unread_count: -3,
            username: "ana".into(),
            last_message: None,
        };
        let conversation = Conversation::from(record);
        assert_eq!(conversation.unread_count, 0);
        assert_eq!(conversation.last_message_preview, "");
    }

    #[test]
    fn counterpart_is_the_other_party() {
        let message = Message {
            id: MessageId::Confirmed(1),
            text: "x".into(),
            sent_at: 0,
            edited_at: 0,
            read: false,
            sender_id: UserId(1),
            recipient_id: UserId(2),
            direction: Direction::Outgoing,
            sender_username: None,
        };
        assert_eq!(message.counterpart(UserId(1)), UserId(2));
        assert_eq!(message.counterpart(UserId(2)), UserId(1));
        assert!(message.involves(UserId(2)));
        assert!(!message.involves(UserId(3)));
    }
}
