//! Outbound side of the persistent connection.
//!
//! The transport owns the single connection handle and turns outbound intents
//! into encoded frames. It never touches the stores.
//!
//! # Link states
//!
//! ```text
//! Unattached --attach--> Open --write fails / connection_lost--> Lost
//!                         ^                                       |
//!                         +----------------attach-----------------+
//! ```
//!
//! Before the first attach every send fails with `NotConnected`. Once a
//! connection has been open, a lost link queues text messages and read
//! receipts in a bounded outbox and flushes them, in order, on re-attach.
//! Typing notifications are ephemeral and are dropped while the link is down.

use std::collections::VecDeque;

use parley_core::{ChatError, Environment, MessageId, UserId};
use parley_proto::ClientFrame;

use crate::Connection;

/// Transport tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Frames kept for resend while the link is lost. The oldest frame is
    /// dropped when full.
    pub outbox_capacity: usize,
}

impl TransportConfig {
    /// Default outbox capacity.
    pub const DEFAULT_OUTBOX_CAPACITY: usize = 128;
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { outbox_capacity: Self::DEFAULT_OUTBOX_CAPACITY }
    }
}

/// Connection state as seen by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection was ever attached.
    Unattached,
    /// Frames are written immediately.
    Open,
    /// The connection dropped; resendable frames are queued.
    Lost,
}

/// Owns the connection handle and encodes outbound intents.
pub struct Transport<E: Environment> {
    env: E,
    config: TransportConfig,
    connection: Option<Box<dyn Connection>>,
    state: LinkState,
    outbox: VecDeque<ClientFrame>,
}

impl<E: Environment> Transport<E> {
    /// Create an unattached transport.
    pub fn new(env: E, config: TransportConfig) -> Self {
        Self {
            env,
            config,
            connection: None,
            state: LinkState::Unattached,
            outbox: VecDeque::new(),
        }
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Frames waiting for a connection.
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    /// Install a connection handle and flush queued frames.
    ///
    /// Returns the number of frames flushed. If the new connection fails
    /// during the flush, the link is lost again and unsent frames stay queued.
    ///
    /// # Errors
    ///
    /// - `ChatError::AlreadyAttached` if a connection is open
    pub fn attach(&mut self, connection: Box<dyn Connection>) -> Result<usize, ChatError> {
        if self.state == LinkState::Open {
            return Err(ChatError::AlreadyAttached);
        }

        let reattached = self.state == LinkState::Lost;
        self.connection = Some(connection);
        self.state = LinkState::Open;

        let mut flushed = 0;
        while let Some(frame) = self.outbox.pop_front() {
            if !self.write(&frame)? {
                self.outbox.push_front(frame);
                break;
            }
            flushed += 1;
        }

        tracing::info!(reattached, flushed, pending = self.outbox.len(), "connection attached");
        Ok(flushed)
    }

    /// Mark the connection as dropped. A never-attached transport stays
    /// unattached.
    pub fn connection_lost(&mut self) {
        if self.state == LinkState::Open {
            self.connection = None;
            self.state = LinkState::Lost;
            tracing::warn!(pending = self.outbox.len(), "connection lost");
        }
    }

    /// Send chat text to `counterpart`.
    ///
    /// Returns the placeholder id the frame carries, for the optimistic local
    /// message. Succeeds while the link is lost; the frame is queued.
    ///
    /// # Errors
    ///
    /// - `ChatError::NotConnected` before the first attach
    /// - `ChatError::Decode` if the frame cannot be encoded
    pub fn send_message(&mut self, counterpart: UserId, text: &str) -> Result<i64, ChatError> {
        self.ensure_attached()?;

        let random_id = MessageId::pending(&self.env).value();
        let frame = ClientFrame::TextMessage { user_pk: counterpart, text: text.to_owned(), random_id };
        self.submit(frame, true)?;

        tracing::debug!(user_id = %counterpart, random_id, "text message sent");
        Ok(random_id)
    }

    /// Acknowledge that `message_id` from `counterpart` was read.
    /// Fire-and-forget.
    ///
    /// # Errors
    ///
    /// - `ChatError::NotConnected` before the first attach
    pub fn send_read_receipt(&mut self, counterpart: UserId, message_id: i64) -> Result<(), ChatError> {
        self.ensure_attached()?;
        self.submit(ClientFrame::MessageRead { user_pk: counterpart, message_id }, true)
    }

    /// Tell `counterpart` we started or stopped typing. Dropped while the link
    /// is lost.
    ///
    /// # Errors
    ///
    /// - `ChatError::NotConnected` before the first attach
    pub fn send_typing(&mut self, counterpart: UserId, typing: bool) -> Result<(), ChatError> {
        self.ensure_attached()?;
        let frame = if typing {
            ClientFrame::IsTyping { user_pk: counterpart }
        } else {
            ClientFrame::TypingStopped { user_pk: counterpart }
        };
        self.submit(frame, false)
    }

    fn ensure_attached(&self) -> Result<(), ChatError> {
        match self.state {
            LinkState::Unattached => Err(ChatError::NotConnected),
            LinkState::Open | LinkState::Lost => Ok(()),
        }
    }

    fn submit(&mut self, frame: ClientFrame, resendable: bool) -> Result<(), ChatError> {
        if self.state == LinkState::Open && self.write(&frame)? {
            return Ok(());
        }

        if resendable {
            self.enqueue(frame);
        } else {
            tracing::debug!(msg_type = ?frame.msg_type(), "link down, frame dropped");
        }
        Ok(())
    }

    /// Write one frame. `Ok(false)` means the connection closed and the link
    /// is now lost.
    fn write(&mut self, frame: &ClientFrame) -> Result<bool, ChatError> {
        let encoded = frame.encode()?;
        let Some(connection) = self.connection.as_mut() else {
            return Ok(false);
        };

        match connection.send(encoded) {
            Ok(()) => Ok(true),
            Err(_closed) => {
                self.connection_lost();
                Ok(false)
            },
        }
    }

    fn enqueue(&mut self, frame: ClientFrame) {
        if self.config.outbox_capacity == 0 {
            tracing::warn!(msg_type = ?frame.msg_type(), "outbox disabled, frame dropped");
            return;
        }
        if self.outbox.len() >= self.config.outbox_capacity
            && let Some(dropped) = self.outbox.pop_front()
        {
            tracing::warn!(
                msg_type = ?dropped.msg_type(),
                capacity = self.config.outbox_capacity,
                "outbox full, oldest frame dropped"
            );
        }
        self.outbox.push_back(frame);
    }
}

impl<E: Environment> std::fmt::Debug for Transport<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state)
            .field("outbox", &self.outbox.len())
            .finish_non_exhaustive()
    }
}
