//! Client errors.

use parley_client::ws::WsError;
use thiserror::Error;

/// Errors from the terminal client's I/O.
#[derive(Debug, Error)]
pub enum CliError {
    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed or returned an error status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Websocket could not be opened.
    #[error("websocket error: {0}")]
    Ws(#[from] WsError),

    /// A credential is not a valid header value.
    #[error("invalid {name} header: {reason}")]
    InvalidHeader {
        /// Header name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
