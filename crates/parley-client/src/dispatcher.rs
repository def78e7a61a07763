//! Inbound frame dispatch.
//!
//! Decodes each raw frame by `msg_type` and republishes it on the bus as the
//! matching typed event. Unknown and reserved frame types are dropped without
//! error; malformed frames are reported to the caller and never close the
//! connection.

use std::rc::Rc;

use parley_core::{
    Direction, Environment, EventBus, Message, MessageId, Topic, UserId,
    events::{
        IncomingMessage, MessageIdCreated, NewUnreadCount, PresenceChanged, ReadReceipt,
        ServerError, TypingChanged,
    },
};
use parley_proto::{ProtocolError, ServerFrame, payloads::TextMessage};

/// Translates inbound frames into bus publications.
pub struct Dispatcher<E: Environment> {
    env: E,
    bus: Rc<EventBus>,
    local_user: UserId,
}

impl<E: Environment> Dispatcher<E> {
    /// Create a dispatcher publishing on `bus`.
    ///
    /// `local_user` fills in the recipient of text frames that omit it.
    pub fn new(env: E, bus: Rc<EventBus>, local_user: UserId) -> Self {
        Self { env, bus, local_user }
    }

    /// Decode `raw` and publish it.
    ///
    /// Returns the topic published on, or `None` if the frame was ignored.
    ///
    /// # Errors
    ///
    /// - Any `ProtocolError` from decoding. Nothing is published.
    pub fn on_frame(&self, raw: &str) -> Result<Option<Topic>, ProtocolError> {
        let frame = ServerFrame::decode(raw).inspect_err(|error| {
            tracing::warn!(%error, len = raw.len(), "dropping undecodable frame");
        })?;

        let topic = match frame {
            ServerFrame::TextMessage(text) => {
                let message = self.incoming(text);
                tracing::debug!(user_id = %message.sender_id, id = %message.id, "incoming message");
                self.publish(&IncomingMessage(message))
            },
            ServerFrame::MessageIdCreated(created) => self.publish(&MessageIdCreated {
                random_id: created.random_id,
                db_id: created.db_id,
            }),
            ServerFrame::NewUnreadCount(unread) => self.publish(&NewUnreadCount {
                user_id: unread.sender,
                count: unread.unread_count,
            }),
            ServerFrame::WentOnline(presence) => {
                self.publish(&PresenceChanged { user_id: presence.user_pk, online: true })
            },
            ServerFrame::WentOffline(presence) => {
                self.publish(&PresenceChanged { user_id: presence.user_pk, online: false })
            },
            ServerFrame::IsTyping(presence) => {
                self.publish(&TypingChanged { user_id: presence.user_pk, typing: true })
            },
            ServerFrame::TypingStopped(presence) => {
                self.publish(&TypingChanged { user_id: presence.user_pk, typing: false })
            },
            ServerFrame::MessageRead(notice) => {
                self.publish(&ReadReceipt { message_id: notice.message_id, at: self.env.now() })
            },
            ServerFrame::ErrorOccurred(notice) => {
                tracing::warn!(code = notice.code(), "server reported error");
                self.publish(&ServerError { code: notice.code(), message: notice.text().to_owned() })
            },
            ServerFrame::FileMessage => {
                tracing::debug!("ignoring file message");
                return Ok(None);
            },
            ServerFrame::Unknown(code) => {
                tracing::debug!(msg_type = code, "ignoring unknown frame");
                return Ok(None);
            },
        };

        Ok(Some(topic))
    }

    /// The server does not echo a send time, so receipt time stands in.
    fn incoming(&self, text: TextMessage) -> Message {
        let now = self.env.now();
        Message {
            id: MessageId::Confirmed(text.persisted_id().unwrap_or(text.random_id)),
            text: text.text,
            sent_at: now,
            edited_at: now,
            read: false,
            sender_id: text.sender,
            recipient_id: text.receiver.unwrap_or(self.local_user),
            direction: Direction::Incoming,
            sender_username: text.sender_username,
        }
    }

    fn publish<T: parley_core::Event>(&self, event: &T) -> Topic {
        self.bus.publish(event);
        T::TOPIC
    }
}
