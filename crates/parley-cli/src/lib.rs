//! Line-based terminal frontend for Parley.
//!
//! - [`HttpChatApi`]: the host's chat endpoints over reqwest
//! - [`LineDriver`]: stdin commands, a websocket and line rendering

#![forbid(unsafe_code)]

pub mod api;
pub mod driver;
pub mod error;
pub mod input;
pub mod render;

pub use api::{HttpChatApi, websocket_url};
pub use driver::LineDriver;
pub use error::CliError;
