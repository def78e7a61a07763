//! Protocol error types.

use thiserror::Error;

use crate::MsgType;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding frames.
///
/// Decoding errors are never fatal to the connection: the caller drops the
/// frame and keeps reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame text is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// Frame is valid JSON but has no `msg_type` field.
    #[error("frame has no msg_type field")]
    MissingMsgType,

    /// `msg_type` is present but not a non-negative integer.
    #[error("msg_type is not a non-negative integer: {0}")]
    InvalidMsgType(String),

    /// Payload fields do not match what the `msg_type` requires.
    #[error("invalid {msg_type:?} payload: {reason}")]
    InvalidPayload {
        /// Discriminant of the offending frame
        msg_type: MsgType,
        /// Deserializer message
        reason: String,
    },

    /// Outbound frame could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
}
