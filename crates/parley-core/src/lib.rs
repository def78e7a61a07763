//! Core of the Parley chat engine.
//!
//! Domain types shared by every layer above the wire protocol, and the
//! process-local event bus that decouples producers and consumers of chat
//! events.
//!
//! # Components
//!
//! - [`EventBus`]: topic-keyed, synchronous publish/subscribe
//! - [`events`]: one payload type per bus topic
//! - [`Message`], [`MessageId`], [`Conversation`]: the data model
//! - [`Environment`]: time and randomness, swappable for simulation
//! - [`ChatError`]: the error taxonomy surfaced to callers
//!
//! Everything here is single-threaded by construction (`Rc`, `RefCell`). Work
//! arriving from other threads must be marshalled onto the logic thread
//! before it touches the bus.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bus;
pub mod env;
pub mod error;
pub mod events;
pub mod model;
mod system_env;

pub use bus::{Delivery, Event, EventBus, Subscription, Topic};
pub use env::Environment;
pub use error::{ChatError, HandlerError};
pub use model::{Conversation, Direction, DirectoryUser, Message, MessageId, Timestamp};
pub use parley_proto::UserId;
pub use system_env::SystemEnv;
