//! Inbound and outbound frames.
//!
//! Decoding is two-phase: the frame is parsed as a JSON object, `msg_type` is
//! read, and only then is the body deserialized into the payload type that
//! discriminant requires. Unknown discriminants decode successfully to
//! [`ServerFrame::Unknown`] so that new server frame types never break an
//! older client.

use serde::{Serialize, Serializer, de::DeserializeOwned, ser::SerializeMap};
use serde_json::Value;

use crate::{
    MsgType, UserId,
    errors::{ProtocolError, Result},
    payloads::{ErrorNotice, IdCreated, Presence, ReadNotice, TextMessage, UnreadCount},
};

/// Frame received from the server, decoded by `msg_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// A user came online.
    WentOnline(Presence),
    /// A user went offline.
    WentOffline(Presence),
    /// Chat text from a counterpart.
    TextMessage(TextMessage),
    /// File message. Reserved; the body is not interpreted.
    FileMessage,
    /// A counterpart started typing.
    IsTyping(Presence),
    /// A counterpart read one of our messages.
    MessageRead(ReadNotice),
    /// The server rejected something we sent.
    ErrorOccurred(ErrorNotice),
    /// A locally sent message was persisted.
    MessageIdCreated(IdCreated),
    /// Unread counter changed.
    NewUnreadCount(UnreadCount),
    /// A counterpart stopped typing.
    TypingStopped(Presence),
    /// Discriminant this client does not know. Carries the raw code.
    Unknown(u64),
}

impl ServerFrame {
    /// Decode one frame from its JSON text.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MalformedJson` if the text is not JSON
    /// - `ProtocolError::MissingMsgType` if there is no `msg_type` field
    /// - `ProtocolError::InvalidMsgType` if `msg_type` is not a non-negative
    ///   integer
    /// - `ProtocolError::InvalidPayload` if the body does not match the
    ///   payload the discriminant requires
    pub fn decode(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;

        let tag = value.get("msg_type").ok_or(ProtocolError::MissingMsgType)?;
        let code = tag.as_u64().ok_or_else(|| ProtocolError::InvalidMsgType(tag.to_string()))?;

        let Some(msg_type) = MsgType::from_code(code) else {
            return Ok(Self::Unknown(code));
        };

        let frame = match msg_type {
            MsgType::WentOnline => Self::WentOnline(body(msg_type, value)?),
            MsgType::WentOffline => Self::WentOffline(body(msg_type, value)?),
            MsgType::TextMessage => Self::TextMessage(body(msg_type, value)?),
            MsgType::FileMessage => Self::FileMessage,
            MsgType::IsTyping => Self::IsTyping(body(msg_type, value)?),
            MsgType::MessageRead => Self::MessageRead(body(msg_type, value)?),
            MsgType::ErrorOccurred => Self::ErrorOccurred(body(msg_type, value)?),
            MsgType::MessageIdCreated => Self::MessageIdCreated(body(msg_type, value)?),
            MsgType::NewUnreadCount => Self::NewUnreadCount(body(msg_type, value)?),
            MsgType::TypingStopped => Self::TypingStopped(body(msg_type, value)?),
        };

        Ok(frame)
    }

    /// Discriminant of this frame. `None` for [`ServerFrame::Unknown`].
    #[must_use]
    pub const fn msg_type(&self) -> Option<MsgType> {
        match self {
            Self::WentOnline(_) => Some(MsgType::WentOnline),
            Self::WentOffline(_) => Some(MsgType::WentOffline),
            Self::TextMessage(_) => Some(MsgType::TextMessage),
            Self::FileMessage => Some(MsgType::FileMessage),
            Self::IsTyping(_) => Some(MsgType::IsTyping),
            Self::MessageRead(_) => Some(MsgType::MessageRead),
            Self::ErrorOccurred(_) => Some(MsgType::ErrorOccurred),
            Self::MessageIdCreated(_) => Some(MsgType::MessageIdCreated),
            Self::NewUnreadCount(_) => Some(MsgType::NewUnreadCount),
            Self::TypingStopped(_) => Some(MsgType::TypingStopped),
            Self::Unknown(_) => None,
        }
    }
}

fn body<T: DeserializeOwned>(msg_type: MsgType, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::InvalidPayload { msg_type, reason: e.to_string() })
}

/// Frame this client writes to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Send chat text to a counterpart.
    TextMessage {
        /// Counterpart user.
        user_pk: UserId,
        /// Message body.
        text: String,
        /// Local placeholder id (negative).
        random_id: i64,
    },
    /// Acknowledge that a counterpart's message was read.
    MessageRead {
        /// Counterpart user.
        user_pk: UserId,
        /// Persisted id of the message.
        message_id: i64,
    },
    /// Tell a counterpart we started typing.
    IsTyping {
        /// Counterpart user.
        user_pk: UserId,
    },
    /// Tell a counterpart we stopped typing.
    TypingStopped {
        /// Counterpart user.
        user_pk: UserId,
    },
}

impl ClientFrame {
    /// Discriminant of this frame.
    #[must_use]
    pub const fn msg_type(&self) -> MsgType {
        match self {
            Self::TextMessage { .. } => MsgType::TextMessage,
            Self::MessageRead { .. } => MsgType::MessageRead,
            Self::IsTyping { .. } => MsgType::IsTyping,
            Self::TypingStopped { .. } => MsgType::TypingStopped,
        }
    }

    /// Counterpart this frame is addressed to.
    #[must_use]
    pub const fn counterpart(&self) -> UserId {
        match self {
            Self::TextMessage { user_pk, .. }
            | Self::MessageRead { user_pk, .. }
            | Self::IsTyping { user_pk }
            | Self::TypingStopped { user_pk } => *user_pk,
        }
    }

    /// Encode to JSON text.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

impl Serialize for ClientFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("msg_type", &self.msg_type().code())?;
        map.serialize_entry("user_pk", &self.counterpart())?;
        match self {
            Self::TextMessage { text, random_id, .. } => {
                map.serialize_entry("text", text)?;
                map.serialize_entry("random_id", random_id)?;
            },
            Self::MessageRead { message_id, .. } => {
                map.serialize_entry("message_id", message_id)?;
            },
            Self::IsTyping { .. } | Self::TypingStopped { .. } => {},
        }
        map.end()
    }
}
