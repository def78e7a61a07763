//! Runtime error types.

use parley_core::ChatError;
use thiserror::Error;

/// Errors that stop the [`Runtime`](crate::Runtime).
#[derive(Error, Debug)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// The driver failed.
    #[error("driver error: {0}")]
    Driver(#[source] E),

    /// A step the session cannot run without failed, such as identifying the
    /// local user.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The connection could not be re-established.
    #[error("gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted {
        /// Attempts made
        attempts: u32,
    },
}
