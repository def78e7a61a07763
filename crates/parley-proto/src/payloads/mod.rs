//! Typed payloads of inbound frames.
//!
//! Each struct is the body of one `msg_type`, minus the discriminant itself.
//! Unknown extra fields are ignored so the server can grow frames without
//! breaking older clients.

pub mod chat;
pub mod session;

pub use chat::{IdCreated, ReadNotice, TextMessage, UnreadCount};
pub use session::{ErrorNotice, Presence};
