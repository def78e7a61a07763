//! Error types for the chat engine.

use parley_proto::{ProtocolError, UserId};
use thiserror::Error;

use crate::Topic;

/// Errors surfaced by chat operations.
///
/// Failures are scoped to the attempted operation. None of them leave a store
/// partially updated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Transport used before any connection was attached.
    #[error("not connected")]
    NotConnected,

    /// A connection is already open.
    #[error("connection already attached")]
    AlreadyAttached,

    /// A frame could not be decoded or encoded. Inbound frames that fail are
    /// dropped and the connection stays open.
    #[error("protocol error: {0}")]
    Decode(#[from] ProtocolError),

    /// A load from the HTTP collaborator failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Message text was empty or whitespace.
    #[error("message is empty")]
    EmptyMessage,

    /// Operation needs an active conversation.
    #[error("no conversation selected")]
    NoSelection,

    /// Selected user is neither a conversation nor in the directory.
    #[error("unknown user {0}")]
    UnknownUser(UserId),
}

impl ChatError {
    /// Whether the rendering collaborator should show this to the user.
    ///
    /// Decode failures and double attaches are operational noise and only
    /// logged.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Decode(_) | Self::AlreadyAttached)
    }
}

/// Error returned by a bus handler.
///
/// The bus logs it and continues delivering to the remaining handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The store is already mutably borrowed further up the call stack.
    #[error("{store} is busy")]
    Busy {
        /// Name of the store
        store: &'static str,
    },

    /// Payload type did not match the topic's registered type.
    #[error("payload type mismatch on {topic}")]
    PayloadMismatch {
        /// Topic the payload was published on
        topic: Topic,
    },

    /// Handler refused the event.
    #[error("rejected: {0}")]
    Rejected(String),
}
