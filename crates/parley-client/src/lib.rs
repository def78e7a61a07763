//! Protocol plumbing for the Parley chat engine.
//!
//! Sans-IO: nothing in this crate performs I/O on its own. The [`Transport`]
//! writes encoded frames into whatever [`Connection`] it was handed, and the
//! [`Dispatcher`] turns raw inbound frames into bus publications. A driver
//! owns the actual socket.
//!
//! # Feature Flags
//!
//! - `transport`: enables [`ws::connect`], a tokio-tungstenite websocket that
//!   bridges a socket to channels.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod connection;
mod dispatcher;
mod reconnect;
mod transport;

#[cfg(feature = "transport")]
pub mod ws;

pub use connection::{Connection, ConnectionClosed};
pub use dispatcher::Dispatcher;
pub use reconnect::ReconnectPolicy;
pub use transport::{LinkState, Transport, TransportConfig};
