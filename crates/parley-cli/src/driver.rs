//! Terminal driver.
//!
//! Implements [`Driver`] with stdin lines for input, a websocket for frames
//! and [`render_lines`] for output. The websocket runs on its own task; this
//! driver only moves text between it and the runtime.

use std::io::Write;

use futures::{FutureExt, future::LocalBoxFuture};
use parley_app::{Driver, DriverInput, SessionView};
use parley_client::{Connection, ws};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::{CliError, input::parse_line, render::render_lines};

enum Wake {
    Frame(Option<String>),
    Line(Option<String>),
}

/// Line-based [`Driver`] writing to `W`.
pub struct LineDriver<W: Write> {
    ws_url: String,
    cookie: Option<String>,
    socket: Option<ws::Socket>,
    stdin: Lines<BufReader<Stdin>>,
    out: W,
    previous: Option<SessionView>,
}

impl<W: Write> LineDriver<W> {
    /// Create a driver for the websocket at `ws_url`.
    pub fn new(ws_url: String, cookie: Option<String>, out: W) -> Self {
        Self {
            ws_url,
            cookie,
            socket: None,
            stdin: BufReader::new(tokio::io::stdin()).lines(),
            out,
            previous: None,
        }
    }

    fn notice(&mut self, text: &str) -> Result<(), CliError> {
        writeln!(self.out, "!! {text}")?;
        Ok(())
    }
}

async fn recv(socket: &mut Option<ws::Socket>) -> Option<String> {
    match socket {
        Some(socket) => socket.inbound.recv().await,
        None => std::future::pending().await,
    }
}

impl<W: Write> Driver for LineDriver<W> {
    type Error = CliError;

    async fn next_input(&mut self) -> Result<DriverInput, CliError> {
        loop {
            let wake = {
                let socket = &mut self.socket;
                let stdin = &mut self.stdin;
                tokio::select! {
                    frame = recv(socket) => Wake::Frame(frame),
                    line = stdin.next_line() => Wake::Line(line?),
                }
            };

            match wake {
                Wake::Frame(Some(frame)) => return Ok(DriverInput::Frame(frame)),
                Wake::Frame(None) => {
                    if let Some(socket) = self.socket.take() {
                        socket.stop();
                    }
                    return Ok(DriverInput::Disconnected);
                },
                Wake::Line(None) => return Ok(DriverInput::Quit),
                Wake::Line(Some(line)) => match parse_line(&line) {
                    Ok(Some(input)) => return Ok(input),
                    Ok(None) => {},
                    Err(error) => self.notice(&error.to_string())?,
                },
            }
        }
    }

    type Link = ws::Socket;

    fn connect(&self) -> LocalBoxFuture<'static, Result<ws::Socket, CliError>> {
        let url = self.ws_url.clone();
        let cookie = self.cookie.clone();
        async move { ws::connect(&url, cookie.as_deref()).await.map_err(CliError::from) }.boxed_local()
    }

    fn install(&mut self, socket: ws::Socket) -> Box<dyn Connection> {
        let outbound = socket.outbound.clone();
        if let Some(old) = self.socket.replace(socket) {
            old.stop();
        }
        Box::new(outbound)
    }

    fn render(&mut self, view: &SessionView) -> Result<(), CliError> {
        for line in render_lines(self.previous.as_ref(), view) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        self.previous = Some(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.stop();
        }
    }
}
