//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the runtime from specific I/O
//! implementations. Each frontend implements it to provide platform-specific
//! input, connection setup and rendering, while the generic
//! [`Runtime`](crate::Runtime) handles all orchestration.

use std::future::Future;

use futures::future::LocalBoxFuture;
use parley_client::Connection;
use parley_core::UserId;

use crate::SessionView;

/// Intent entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Open the conversation with a user.
    Select {
        /// Counterpart
        user_id: UserId,
    },
    /// Send text to the active conversation.
    Send {
        /// Message body
        text: String,
    },
    /// Started (`true`) or stopped (`false`) typing.
    Typing(bool),
    /// Filter the user directory.
    Search(String),
}

/// One input for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverInput {
    /// Raw frame received on the connection.
    Frame(String),
    /// User intent.
    Command(UserCommand),
    /// The connection closed.
    Disconnected,
    /// Shut down.
    Quit,
}

/// Abstracts I/O operations for the runtime.
///
/// # Implementations
///
/// - **CLI**: stdin commands, a websocket, line-based rendering
/// - **Simulation**: scripted inputs and recording connections
pub trait Driver {
    /// Platform-specific error type.
    type Error: std::error::Error + 'static;

    /// Wait for the next input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input source fails. The runtime stops.
    fn next_input(&mut self) -> impl Future<Output = Result<DriverInput, Self::Error>>;

    /// Established connection that [`install`](Self::install) turns into a
    /// write half.
    type Link: 'static;

    /// Start establishing the persistent connection.
    ///
    /// The returned future owns everything it needs: the runtime keeps polling
    /// [`next_input`](Self::next_input) while it is pending.
    ///
    /// # Errors
    ///
    /// The future fails if the connection cannot be established. The runtime
    /// retries according to its reconnect policy.
    fn connect(&self) -> LocalBoxFuture<'static, Result<Self::Link, Self::Error>>;

    /// Adopt an established link and return its write half. Subsequent inbound
    /// frames arrive through [`next_input`](Self::next_input).
    fn install(&mut self, link: Self::Link) -> Box<dyn Connection>;

    /// Render the session.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &SessionView) -> Result<(), Self::Error>;

    /// Close the connection and clean up resources.
    fn stop(&mut self);
}
