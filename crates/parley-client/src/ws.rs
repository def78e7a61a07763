//! WebSocket transport for the client.
//!
//! Provides [`Socket`], which bridges a websocket to a pair of channels. This
//! is a thin layer that only moves text frames; protocol logic stays in the
//! sans-IO [`Transport`](crate::Transport) and [`Dispatcher`](crate::Dispatcher).

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message as WsMessage,
        client::IntoClientRequest,
        http::{HeaderValue, header::COOKIE},
    },
};

/// WebSocket errors.
#[derive(Debug, Error)]
pub enum WsError {
    /// URL could not be turned into a request.
    #[error("invalid websocket url: {0}")]
    InvalidUrl(String),

    /// Cookie is not a valid header value.
    #[error("invalid cookie header: {0}")]
    InvalidCookie(String),

    /// Handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Handshake did not finish within [`CONNECT_TIMEOUT`].
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Upper bound on the websocket handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to an open websocket.
///
/// Frames written to `outbound` are sent as text messages; text messages from
/// the server arrive on `inbound`. When the socket closes, `inbound` yields
/// `None` and sends on `outbound` fail.
pub struct Socket {
    /// Send frames to the server.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Receive frames from the server.
    pub inbound: mpsc::UnboundedReceiver<String>,
    /// Abort handle to stop the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl Socket {
    /// Stop the socket task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open a websocket to `url`, authenticating with the host's session cookie.
pub async fn connect(url: &str, cookie: Option<&str>) -> Result<Socket, WsError> {
    let mut request = url.into_client_request().map_err(|e| WsError::InvalidUrl(e.to_string()))?;
    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(cookie).map_err(|e| WsError::InvalidCookie(e.to_string()))?;
        request.headers_mut().insert(COOKIE, value);
    }

    let (stream, _response) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(request))
        .await
        .map_err(|_elapsed| WsError::Timeout(CONNECT_TIMEOUT))?
        .map_err(|e| WsError::Connection(e.to_string()))?;
    tracing::info!(url, "websocket connected");

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(run_socket(stream, outbound_rx, inbound_tx));

    Ok(Socket { outbound: outbound_tx, inbound: inbound_rx, abort_handle: handle.abort_handle() })
}

/// Pump frames between the channels and the socket until either side closes.
async fn run_socket(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<String>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    if let Err(error) = sink.close().await {
                        tracing::debug!(%error, "close failed");
                    }
                    break;
                };
                if let Err(error) = sink.send(WsMessage::Text(frame.into())).await {
                    tracing::warn!(%error, "websocket send failed");
                    break;
                }
            },
            message = source.next() => match message {
                Some(Ok(WsMessage::Text(text))) => {
                    if inbound.send(text.as_str().to_owned()).is_err() {
                        break;
                    }
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    tracing::info!("websocket closed by server");
                    break;
                },
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    tracing::warn!(%error, "websocket receive failed");
                    break;
                },
            },
        }
    }
}
