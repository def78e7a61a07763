//! Application layer for Parley
//!
//! Stateful stores, session orchestration and a generic runtime, written so
//! the same code runs in production and in deterministic simulation.
//!
//! # Components
//!
//! - [`ConversationStore`]: conversation list with previews and unread counters
//! - [`TimelineStore`]: ordered history of the active conversation
//! - [`SelectionController`]: which conversation is active
//! - [`UserDirectory`]: users the local user can start a conversation with
//! - [`ChatSession`]: owns the bus, transport and stores and wires them
//! - [`Driver`]: trait for platform-specific I/O
//! - [`ChatApi`]: trait for the host's HTTP endpoints
//! - [`Runtime`]: generic orchestration loop over a driver and an API

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod api;
mod config;
mod conversations;
mod directory;
mod driver;
mod error;
mod runtime;
mod selection;
mod session;
mod timeline;
mod view;

pub use action::SessionAction;
pub use api::ChatApi;
pub use config::SessionConfig;
pub use conversations::ConversationStore;
pub use directory::UserDirectory;
pub use driver::{Driver, DriverInput, UserCommand};
pub use error::RuntimeError;
pub use runtime::Runtime;
pub use selection::{ActiveDialog, SelectionController};
pub use session::ChatSession;
pub use timeline::TimelineStore;
pub use view::SessionView;
