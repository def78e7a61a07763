//! Bus payloads, one type per topic.
//!
//! Publishers and subscribers agree on the payload through the type itself:
//! subscribing to `IncomingMessage` can only ever receive an
//! `IncomingMessage`.

use parley_proto::UserId;

use crate::{
    Event, Message, Topic,
    model::{MessageId, Timestamp},
};

/// The active conversation changed. Published after the selection is updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogChanged {
    /// New counterpart.
    pub user_id: UserId,
    /// Counterpart display name.
    pub username: String,
}

impl Event for DialogChanged {
    const TOPIC: Topic = Topic::DialogChanged;
}

/// A message was sent optimistically by the local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage(pub Message);

impl Event for OutgoingMessage {
    const TOPIC: Topic = Topic::OutgoingMessage;
}

/// A message arrived from a counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage(pub Message);

impl Event for IncomingMessage {
    const TOPIC: Topic = Topic::IncomingMessage;
}

/// The server persisted a locally sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageIdCreated {
    /// Placeholder id sent with the message.
    pub random_id: i64,
    /// Persisted id.
    pub db_id: i64,
}

impl MessageIdCreated {
    /// The id the timeline currently holds.
    #[must_use]
    pub const fn pending(&self) -> MessageId {
        MessageId::Pending(self.random_id)
    }

    /// The id it should hold afterwards.
    #[must_use]
    pub const fn confirmed(&self) -> MessageId {
        MessageId::Confirmed(self.db_id)
    }
}

impl Event for MessageIdCreated {
    const TOPIC: Topic = Topic::MessageIdCreated;
}

/// Server-reported unread counter for one conversation. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewUnreadCount {
    /// Counterpart.
    pub user_id: UserId,
    /// Raw counter.
    pub count: i64,
}

impl Event for NewUnreadCount {
    const TOPIC: Topic = Topic::NewUnreadCount;
}

/// A mark-all-read round trip completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagesRead {
    /// Counterpart.
    pub user_id: UserId,
    /// Unread messages left; zero after a successful round trip.
    pub count: u32,
}

impl Event for MessagesRead {
    const TOPIC: Topic = Topic::MessagesRead;
}

/// A user connected or disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceChanged {
    /// User.
    pub user_id: UserId,
    /// Whether they are now online.
    pub online: bool,
}

impl Event for PresenceChanged {
    const TOPIC: Topic = Topic::PresenceChanged;
}

/// A counterpart started or stopped typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingChanged {
    /// User.
    pub user_id: UserId,
    /// Whether they are typing now.
    pub typing: bool,
}

impl Event for TypingChanged {
    const TOPIC: Topic = Topic::TypingChanged;
}

/// A counterpart read one of our messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadReceipt {
    /// Persisted id of the message.
    pub message_id: i64,
    /// When the receipt was received.
    pub at: Timestamp,
}

impl Event for ReadReceipt {
    const TOPIC: Topic = Topic::ReadReceipt;
}

/// The server rejected a frame we sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Server error code.
    pub code: u16,
    /// Human-readable description.
    pub message: String,
}

impl Event for ServerError {
    const TOPIC: Topic = Topic::ServerError;
}
