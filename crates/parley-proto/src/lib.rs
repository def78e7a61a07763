//! Wire protocol for the Parley chat socket.
//!
//! Frames on the persistent connection are JSON objects tagged by an integer
//! `msg_type` field. This crate owns every cross-boundary representation:
//!
//! - [`MsgType`]: the fixed discriminant codes
//! - [`ServerFrame`]: inbound frames decoded into typed payloads
//! - [`ClientFrame`]: outbound intents encoded into frames
//! - [`rest`]: record shapes returned by the host's HTTP endpoints
//! - [`UserId`]: user identity as the host serializes it
//!
//! Internal events use richer, already-decoded shapes; nothing past this crate
//! should see raw JSON.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod ids;
mod msg_type;
pub mod payloads;
pub mod rest;

pub use errors::ProtocolError;
pub use frame::{ClientFrame, ServerFrame};
pub use ids::UserId;
pub use msg_type::MsgType;
