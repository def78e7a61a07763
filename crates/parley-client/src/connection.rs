//! Connection handle abstraction.

use thiserror::Error;

/// Write half of the persistent connection.
///
/// Writes are non-blocking hand-offs: the implementation queues the frame for
/// an I/O task and returns immediately.
pub trait Connection {
    /// Hand `frame` to the connection.
    ///
    /// # Errors
    ///
    /// Returns the frame back if the connection is closed, so the caller can
    /// queue it for resend.
    fn send(&mut self, frame: String) -> Result<(), ConnectionClosed>;
}

/// The connection is closed. Carries the frame that could not be written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("connection closed")]
pub struct ConnectionClosed {
    /// Frame that was not written.
    pub frame: String,
}

#[cfg(feature = "transport")]
impl Connection for tokio::sync::mpsc::UnboundedSender<String> {
    fn send(&mut self, frame: String) -> Result<(), ConnectionClosed> {
        tokio::sync::mpsc::UnboundedSender::send(self, frame)
            .map_err(|err| ConnectionClosed { frame: err.0 })
    }
}
